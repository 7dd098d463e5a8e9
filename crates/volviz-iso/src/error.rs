//! Isosurface error types.

use thiserror::Error;
use volviz_core::VolumeError;

/// Result type for isosurface operations.
pub type IsoResult<T> = Result<T, IsoError>;

/// Errors that can occur during isosurface extraction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IsoError {
    /// Channel lookup or buffer shape failed.
    #[error(transparent)]
    Volume(#[from] VolumeError),
}
