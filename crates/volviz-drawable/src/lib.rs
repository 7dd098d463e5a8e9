//! # volviz-drawable
//!
//! A renderable multi-channel volume image.
//!
//! [`VolumeDrawable`] owns the channel store, the fusion state, the
//! ray-march integrator and the isosurfaces of one image, and keeps them
//! consistent as channel data arrives and display parameters change.
//!
//! ```text
//! channel data ─► VolumeStore ─► AtlasFuser ─► RayMarchIntegrator ─► VolumeNode
//!                      │
//!                      └────────► IsosurfaceManager ─────────────────► MeshGroupNode
//! ```
//!
//! Per-channel operations never fail: an invalid channel index or a
//! malformed argument is logged and ignored.
//!
//! # Usage
//!
//! ```rust
//! use volviz_core::{TileLayout, VolumeInfo};
//! use volviz_drawable::{DrawableConfig, VolumeDrawable};
//! use volviz_march::CameraState;
//!
//! let layout = TileLayout::packed(8, 8, 8).unwrap();
//! let info = VolumeInfo::new("cells", layout, vec!["dna".into()]);
//! let mut drawable = VolumeDrawable::new(info, DrawableConfig::cpu()).unwrap();
//!
//! drawable.set_channel_data_from_volume(0, &[128; 512]).unwrap();
//! drawable.set_density(0.1);
//! drawable.set_brightness(1.0);
//! let frame = drawable.render(&CameraState::default()).unwrap();
//! assert!(frame.is_some());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod drawable;
pub mod scene;

pub use config::DrawableConfig;
pub use drawable::{MIN_ORTHO_THICKNESS, VolumeDrawable};
pub use scene::{MeshGroupNode, MeshNode, VolumeNode};

use thiserror::Error;
use volviz_atlas::FuseError;
use volviz_core::VolumeError;
use volviz_iso::IsoError;
use volviz_march::MarchError;

/// Errors surfaced by the drawable.
#[derive(Error, Debug)]
pub enum DrawableError {
    /// Store rejected the input.
    #[error(transparent)]
    Volume(#[from] VolumeError),

    /// Fusion failed.
    #[error(transparent)]
    Fuse(#[from] FuseError),

    /// Ray marching failed.
    #[error(transparent)]
    March(#[from] MarchError),

    /// Isosurface extraction failed.
    #[error(transparent)]
    Iso(#[from] IsoError),

    /// Config file could not be parsed.
    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for drawable operations.
pub type DrawableResult<T> = Result<T, DrawableError>;
