//! Channel fusion into a renderable tile atlas.
//!
//! Combines any number of 8-bit volume channels, each with a color, an
//! enabled state and an optional intensity LUT, into one RGBA8 tile atlas
//! plus an R8 mask texture with the same tiling.
//!
//! # Architecture
//!
//! ```text
//! VolumeStore (raw channels)
//!     └── AtlasFuser::fuse(entries, mode, mask)
//!             ├── AtlasTexture (RGBA8, one tile per z-slice)
//!             └── MaskTexture  (R8, same tiling)
//! ```
//!
//! # Example
//!
//! ```rust
//! use volviz_atlas::{AtlasFuser, CombineMode, FusionEntry};
//! use volviz_core::{ChannelColor, Rgb8, TileLayout, VolumeInfo, VolumeStore};
//!
//! let layout = TileLayout::new(2, 2, 1, 1, 1).unwrap();
//! let mut store = VolumeStore::new(VolumeInfo::new("v", layout, vec!["c0".into()])).unwrap();
//! store.set_channel_data_from_volume(0, &[255; 4]).unwrap();
//!
//! let entries = [FusionEntry::new(0, ChannelColor::Enabled(Rgb8::new(255, 0, 0)))];
//! let mut fuser = AtlasFuser::new();
//! let fused = fuser.fuse(&entries, &store, CombineMode::Max, None).unwrap();
//! assert_eq!(fused.atlas.texel(0, 0), [255, 0, 0, 255]);
//! ```

pub mod fuser;
pub mod texture;

pub use fuser::{AtlasFuser, CombineMode, FusedTextures, FusionEntry};
pub use texture::{AtlasTexture, MaskTexture};

use thiserror::Error;
use volviz_core::VolumeError;

/// Fusion errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FuseError {
    #[error("Cannot fuse before the tile layout is known")]
    NotInitialized,

    #[error(transparent)]
    Volume(#[from] VolumeError),
}

pub type FuseResult<T> = Result<T, FuseError>;
