//! Where the ray march runs.
//!
//! [`RenderBackend`] is implemented on the host with rayon and, with the
//! `wgpu` feature, as a compute shader. [`Backend::Auto`] picks the best one
//! that opens on this machine.

mod cpu_backend;
mod detect;
mod handle;
mod limits;

#[cfg(feature = "wgpu")]
mod wgpu_backend;

pub use cpu_backend::{CpuBackend, CpuVolume};
pub use detect::{BackendInfo, describe_backends, detect_backends, select_best_backend};
pub use handle::{AsAny, VolumeHandle};
pub use limits::GpuLimits;

#[cfg(feature = "wgpu")]
pub use wgpu_backend::{WgpuBackend, WgpuVolume};

use serde::{Deserialize, Serialize};
use volviz_atlas::{AtlasTexture, MaskTexture};

use crate::{FrameUniforms, MarchResult, RenderedFrame};

/// Backend choice, as written in config files (`auto`, `cpu`, `wgpu`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// GPU when an adapter opens, else CPU.
    #[default]
    Auto,
    /// Rayon reference integrator.
    Cpu,
    /// Compute-shader integrator.
    Wgpu,
}

impl Backend {
    /// Whether [`create_backend`] can succeed for this choice.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Auto | Self::Cpu => true,
            Self::Wgpu => wgpu_available(),
        }
    }
}

#[cfg(feature = "wgpu")]
fn wgpu_available() -> bool {
    WgpuBackend::is_available()
}

#[cfg(not(feature = "wgpu"))]
fn wgpu_available() -> bool {
    false
}

/// A device able to hold volume textures and ray-march them.
pub trait RenderBackend: Send + Sync {
    /// Short lowercase name for logs.
    fn name(&self) -> &'static str;

    /// Capacity checks for uploads and frames.
    fn limits(&self) -> &GpuLimits;

    /// Copies atlas and mask to backend memory.
    fn upload_volume(&self, atlas: &AtlasTexture, mask: &MaskTexture) -> MarchResult<Box<dyn VolumeHandle>>;

    /// Rewrites resident textures in place; the layout must match.
    fn update_volume(&self, handle: &mut dyn VolumeHandle, atlas: &AtlasTexture, mask: &MaskTexture) -> MarchResult<()>;

    /// Ray-marches every pixel of the viewport.
    fn render(&self, volume: &dyn VolumeHandle, uniforms: &FrameUniforms) -> MarchResult<RenderedFrame>;
}

/// Opens `backend`, resolving `Auto` first.
pub fn create_backend(backend: Backend) -> MarchResult<Box<dyn RenderBackend>> {
    let resolved = match backend {
        Backend::Auto => select_best_backend(),
        other => other,
    };
    match resolved {
        Backend::Wgpu => open_wgpu(),
        _ => Ok(Box::new(CpuBackend::new())),
    }
}

#[cfg(feature = "wgpu")]
fn open_wgpu() -> MarchResult<Box<dyn RenderBackend>> {
    Ok(Box::new(WgpuBackend::new()?))
}

#[cfg(not(feature = "wgpu"))]
fn open_wgpu() -> MarchResult<Box<dyn RenderBackend>> {
    Err(crate::MarchError::BackendNotAvailable("built without the wgpu feature".into()))
}
