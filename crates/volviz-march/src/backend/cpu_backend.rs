//! Reference integrator on the host.
//!
//! Textures are plain byte copies; each output row is one rayon task
//! running [`integrate_pixel`] per pixel, the same kernel the WGSL mirrors.

use rayon::prelude::*;
#[allow(unused_imports)]
use tracing::{debug, trace};
use volviz_atlas::{AtlasTexture, MaskTexture};
use volviz_core::TileLayout;

use super::handle::{resident, resident_mut};
use super::{AsAny, GpuLimits, RenderBackend, VolumeHandle};
use crate::integrate::integrate_pixel;
use crate::sampler::AtlasSampler;
use crate::{FrameUniforms, MarchError, MarchResult, RenderedFrame};

/// Used when the OS does not report free memory.
const FALLBACK_MEMORY: u64 = 4 << 30;

/// Host copies of the atlas and mask.
pub struct CpuVolume {
    atlas: Vec<u8>,
    mask: Vec<u8>,
    layout: TileLayout,
    generation: u64,
}

impl CpuVolume {
    /// Sampler over the resident textures.
    pub fn sampler(&self) -> AtlasSampler<'_> {
        AtlasSampler::new(&self.atlas, &self.mask, self.layout)
    }
}

impl AsAny for CpuVolume {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl VolumeHandle for CpuVolume {
    fn layout(&self) -> TileLayout {
        self.layout
    }
    fn size_bytes(&self) -> u64 {
        (self.atlas.len() + self.mask.len()) as u64
    }
    fn generation(&self) -> u64 {
        self.generation
    }
}

/// Rayon ray marcher.
pub struct CpuBackend {
    limits: GpuLimits,
}

impl CpuBackend {
    /// Host backend limited by the memory the OS reports as available.
    pub fn new() -> Self {
        // mem_info reports KiB
        let free = sys_info::mem_info().map_or(FALLBACK_MEMORY, |m| m.avail.saturating_mul(1024));
        debug!(free, "cpu backend memory");
        Self { limits: GpuLimits::host(free) }
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn limits(&self) -> &GpuLimits {
        &self.limits
    }

    fn upload_volume(&self, atlas: &AtlasTexture, mask: &MaskTexture) -> MarchResult<Box<dyn VolumeHandle>> {
        let volume = CpuVolume {
            atlas: atlas.data().to_vec(),
            mask: mask.data().to_vec(),
            layout: atlas.layout(),
            generation: atlas.generation(),
        };
        Ok(Box::new(volume))
    }

    fn update_volume(&self, handle: &mut dyn VolumeHandle, atlas: &AtlasTexture, mask: &MaskTexture) -> MarchResult<()> {
        let volume = resident_mut::<CpuVolume>(handle, "cpu")?;
        if volume.layout != atlas.layout() {
            return Err(MarchError::OperationFailed("layout changed; upload a new volume".into()));
        }
        volume.atlas.copy_from_slice(atlas.data());
        volume.mask.copy_from_slice(mask.data());
        volume.generation = atlas.generation();
        Ok(())
    }

    fn render(&self, volume: &dyn VolumeHandle, uniforms: &FrameUniforms) -> MarchResult<RenderedFrame> {
        let volume = resident::<CpuVolume>(volume, "cpu")?;
        let (w, h) = (uniforms.width, uniforms.height);
        if w == 0 || h == 0 {
            return Err(MarchError::InvalidViewport(w, h));
        }
        trace!(w, h, generation = volume.generation, "cpu march");

        let sampler = volume.sampler();
        let stride = w as usize * 4;
        let mut rgba = vec![0.0f32; stride * h as usize];
        rgba.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
            for (x, out) in row.chunks_exact_mut(4).enumerate() {
                let sample = integrate_pixel(uniforms, &sampler, x as u32, y as u32);
                out.copy_from_slice(&sample.color.to_array());
            }
        });

        RenderedFrame::from_rgba(rgba, w, h)
    }
}
