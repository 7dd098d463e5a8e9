//! Error types for volviz-core operations.
//!
//! The [`VolumeError`] enum covers the recoverable failure modes of the
//! volume data model:
//!
//! - Using the store before its tile layout is known
//! - Per-channel operations on an index that was never declared
//! - Channel buffers whose size does not match the tile layout
//! - Malformed input (short color or voxel-size arrays)
//!
//! # Usage
//!
//! ```rust
//! use volviz_core::{VolumeError, VolumeResult};
//!
//! fn check_index(index: usize, count: usize) -> VolumeResult<()> {
//!     if index >= count {
//!         return Err(VolumeError::InvalidChannel { index, count });
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_index(3, 2).is_err());
//! ```
//!
//! # Used By
//!
//! - [`crate::store::VolumeStore`] - channel ingestion and queries
//! - `volviz-atlas` - wrapped in `FuseError`
//! - `volviz-iso` - wrapped in `IsoError`

use thiserror::Error;

/// Result type alias using [`VolumeError`] as the error type.
pub type VolumeResult<T> = std::result::Result<T, VolumeError>;

/// Errors produced by the volume data model.
///
/// None of these are fatal: the drawable layer turns every variant into a
/// logged no-op so that a bad per-channel update never blanks the volume.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VolumeError {
    /// The tile layout has not been established yet.
    #[error("volume not initialized: tile layout unknown")]
    NotInitialized,

    /// Channel index is out of range.
    #[error("invalid channel index {index} (channel count {count})")]
    InvalidChannel {
        /// Requested index
        index: usize,
        /// Number of declared channels
        count: usize,
    },

    /// Channel buffer has the wrong number of samples.
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch {
        /// Samples required by the tile layout
        expected: usize,
        /// Samples supplied
        actual: usize,
    },

    /// Input array is too short or otherwise unusable.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Tile layout violates its invariants.
    #[error("invalid tile layout: {0}")]
    InvalidLayout(String),

    /// Clip range is inverted or leaves the unit box.
    #[error("invalid clip range on axis {axis}: [{min}, {max}]")]
    InvalidClip {
        /// Axis index (0 = x, 1 = y, 2 = z)
        axis: usize,
        /// Requested minimum
        min: f32,
        /// Requested maximum
        max: f32,
    },
}

impl VolumeError {
    /// Whether this error is the "not initialized" condition.
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::NotInitialized)
    }
}
