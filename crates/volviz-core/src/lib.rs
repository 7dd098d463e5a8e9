//! # volviz-core
//!
//! Core data model for multi-channel volumetric microscopy rendering.
//!
//! This crate provides the foundational types used throughout volviz:
//!
//! - [`VolumeStore`] - Per-channel 8-bit intensity buffers and voxel scale
//! - [`TileLayout`] - Packing of a z-stack into a 2D tile atlas
//! - [`Rgb8`], [`ChannelColor`] - Channel colors with explicit enabled state
//! - [`IntensityLut`] - 256-entry intensity remapping
//! - [`ClipBounds`], [`Axis`] - Clip box in normalized volume space
//!
//! ## Coordinate Conventions
//!
//! The volume occupies the cube `[-0.5, 0.5]³` in object space. Texture
//! space is the same cube shifted to `[0, 1]³`. Voxel buffers are ordered
//! x-fastest, then y, then z.
//!
//! ## Crate Structure
//!
//! ```text
//! volviz-core (this crate)
//!    ^
//!    |
//!    +-- volviz-atlas (channel fusion)
//!    +-- volviz-march (ray-march integrator)
//!    +-- volviz-iso (isosurface extraction)
//!    +-- volviz-drawable (facade)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bounds;
pub mod channel;
pub mod color;
pub mod error;
pub mod layout;
pub mod lut;
pub mod phantom;
pub mod store;

pub use bounds::*;
pub use channel::*;
pub use color::*;
pub use error::*;
pub use layout::*;
pub use lut::*;
pub use phantom::Phantom;
pub use store::*;

/// Prelude module for convenient imports.
///
/// ```
/// use volviz_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bounds::{Axis, ClipBounds};
    pub use crate::color::{ChannelColor, Rgb8, color_for_channel};
    pub use crate::error::{VolumeError, VolumeResult};
    pub use crate::layout::TileLayout;
    pub use crate::lut::IntensityLut;
    pub use crate::store::{ChannelBatch, VolumeInfo, VolumeStore};
}
