//! Ray-march integrator for tile-atlas volumes.
//!
//! Reconstructs a 3D volume from a fused RGBA tile atlas and composites
//! color along one view ray per pixel, either front to back or as a
//! maximum intensity projection.
//!
//! # Architecture
//!
//! ```text
//! RayMarchIntegrator
//!     └── Backend (CPU or wgpu)
//!             └── RenderBackend trait
//!                     ├── CpuBackend (rayon, integrate_pixel)
//!                     └── WgpuBackend (compute shader)
//! ```
//!
//! The per-pixel kernel is a pure function of the pixel coordinates and
//! the frame uniforms:
//!
//! 1. Build the primary ray (perspective or orthographic).
//! 2. Intersect the clip box; a miss is transparent.
//! 3. Step with a fixed length, offset by a per-pixel dither.
//! 4. Sample two z-slices, apply the mask and the transfer function.
//! 5. Composite front to back, or keep the running maximum.
//!
//! # Example
//!
//! ```ignore
//! use volviz_march::{Backend, CameraState, RayMarchIntegrator};
//!
//! let mut integrator = RayMarchIntegrator::new(Backend::Auto)?;
//! integrator.upload(fused_textures)?;
//! let frame = integrator.render(&CameraState::default())?;
//! ```

pub mod backend;
pub mod camera;
pub mod frame;
pub mod integrate;
pub mod integrator;
pub mod ray;
pub mod sampler;
pub mod settings;
mod shaders;

pub use backend::{Backend, GpuLimits, RenderBackend, VolumeHandle, describe_backends, detect_backends, select_best_backend};
pub use camera::{CameraState, FrameUniforms};
pub use frame::RenderedFrame;
pub use integrate::{PixelSample, integrate_pixel, integrate_ray};
pub use integrator::RayMarchIntegrator;
pub use ray::Ray;
pub use sampler::AtlasSampler;
pub use settings::{DEFAULT_FAR_CLIP, MAX_STEPS, RenderSettings};

use thiserror::Error;
use volviz_atlas::FuseError;

/// Ray-march errors
#[derive(Error, Debug)]
pub enum MarchError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("Failed to create device: {0}")]
    DeviceCreation(String),

    #[error("Atlas too large: {width}x{height} exceeds limit {limit}")]
    TextureTooLarge { width: u32, height: u32, limit: u32 },

    #[error("No volume textures uploaded")]
    NoVolume,

    #[error("Invalid viewport: {0}x{1}")]
    InvalidViewport(u32, u32),

    #[error("Invalid render settings: {0}")]
    InvalidSettings(String),

    #[error("Render operation failed: {0}")]
    OperationFailed(String),

    #[error(transparent)]
    Fuse(#[from] FuseError),
}

pub type MarchResult<T> = Result<T, MarchError>;
