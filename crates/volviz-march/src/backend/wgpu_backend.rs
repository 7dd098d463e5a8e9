//! Compute-shader integrator.
//!
//! The atlas and mask live in storage buffers; `RAYMARCH` runs one
//! invocation per output pixel and writes RGBA32F into a frame buffer that
//! is copied back after every dispatch.

use bytemuck::{Pod, Zeroable};
#[allow(unused_imports)]
use tracing::{debug, info, trace};
use volviz_atlas::{AtlasTexture, MaskTexture};
use volviz_core::TileLayout;
use wgpu::util::DeviceExt;

use super::handle::{resident, resident_mut};
use super::{AsAny, GpuLimits, RenderBackend, VolumeHandle};
use crate::shaders;
use crate::{FrameUniforms, MarchError, MarchResult, RenderedFrame};

/// Kernel workgroup edge; must match `@workgroup_size` in the WGSL.
const GROUP: u32 = 16;

const FLAG_ORTHO: u32 = 1;
const FLAG_MIP: u32 = 2;

/// Mirrors the `Params` struct in the kernel, vec4-aligned.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct MarchParams {
    inv_mv: [[f32; 4]; 4],
    clip_min: [f32; 4], // xyz, near clip
    clip_max: [f32; 4], // xyz, far clip
    tone: [f32; 4],     // density, brightness, gamma_min, gamma_max
    misc: [f32; 4],     // gamma_scale, mask_alpha, ortho_thickness, ortho_scale
    view: [f32; 4],     // tan_half_fov, aspect, tstep, opacity exponent
    dims: [u32; 4],     // w, h, steps, flags
    tiles: [u32; 4],    // tile_w, tile_h, depth, atlas_cols
    atlas: [u32; 4],    // atlas_w, atlas_h, 0, 0
}

impl MarchParams {
    fn pack(u: &FrameUniforms, layout: TileLayout) -> Self {
        let s = &u.settings;
        let flags = (s.orthographic as u32 * FLAG_ORTHO) | (s.max_projection as u32 * FLAG_MIP);
        let lo = s.clip.min();
        let hi = s.clip.max();
        Self {
            inv_mv: u.inverse_model_view.to_cols_array_2d(),
            clip_min: [lo.x, lo.y, lo.z, s.near_clip],
            clip_max: [hi.x, hi.y, hi.z, s.far_clip],
            tone: [s.density, s.brightness, s.gamma_min, s.gamma_max],
            misc: [s.gamma_scale, s.mask_alpha, s.ortho_thickness, s.ortho_scale],
            view: [u.tan_half_fov, u.aspect(), s.step_length(), s.opacity_exponent()],
            dims: [u.width, u.height, s.clamped_steps(), flags],
            tiles: [layout.tile_width, layout.tile_height, layout.depth, layout.atlas_cols],
            atlas: [layout.atlas_width(), layout.atlas_height(), 0, 0],
        }
    }
}

/// WGSL reads the mask as `array<u32>`, so the byte length is rounded up.
fn mask_words(mask: &MaskTexture) -> Vec<u8> {
    let raw = mask.data();
    let mut out = Vec::with_capacity(raw.len().div_ceil(4).max(1) * 4);
    out.extend_from_slice(raw);
    while out.is_empty() || out.len() % 4 != 0 {
        out.push(0);
    }
    out
}

/// Resident atlas and mask buffers.
pub struct WgpuVolume {
    atlas: wgpu::Buffer,
    mask: wgpu::Buffer,
    layout: TileLayout,
    generation: u64,
    size_bytes: u64,
}

impl AsAny for WgpuVolume {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl VolumeHandle for WgpuVolume {
    fn layout(&self) -> TileLayout {
        self.layout
    }
    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
    fn generation(&self) -> u64 {
        self.generation
    }
}

/// GPU ray marcher.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    limits: GpuLimits,
}

async fn pick_adapter() -> Option<wgpu::Adapter> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let options = wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        ..Default::default()
    };
    instance.request_adapter(&options).await
}

impl WgpuBackend {
    /// True when some adapter can be opened.
    pub fn is_available() -> bool {
        pollster::block_on(pick_adapter()).is_some()
    }

    /// Opens the preferred adapter and compiles the kernel.
    pub fn new() -> MarchResult<Self> {
        pollster::block_on(Self::open())
    }

    /// Async form of [`WgpuBackend::new`].
    pub async fn open() -> MarchResult<Self> {
        let adapter = pick_adapter().await.ok_or(MarchError::NoAdapter)?;
        let caps = adapter.limits();
        let descriptor = wgpu::DeviceDescriptor {
            label: Some("volviz"),
            required_limits: caps.clone(),
            ..Default::default()
        };
        let (device, queue) = adapter
            .request_device(&descriptor, None)
            .await
            .map_err(|e| MarchError::DeviceCreation(e.to_string()))?;

        let adapter_info = adapter.get_info();
        let limits = GpuLimits {
            max_texture_dim: caps.max_texture_dimension_2d,
            max_buffer_bytes: caps.max_buffer_size.min(caps.max_storage_buffer_binding_size.into()),
            available_memory: usable_memory(adapter_info.device_type, caps.max_buffer_size),
        };
        info!(adapter = %adapter_info.name, memory = limits.available_memory, "opened wgpu device");

        let kernel = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("raymarch"),
            source: wgpu::ShaderSource::Wgsl(shaders::RAYMARCH.into()),
        });
        // bind group layout is reflected from the kernel
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("raymarch"),
            layout: None,
            module: &kernel,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        Ok(Self { device, queue, pipeline, limits })
    }

    fn texture_buffer(&self, label: &str, bytes: &[u8]) -> wgpu::Buffer {
        let usage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST;
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor { label: Some(label), contents: bytes, usage })
    }

    /// Runs the kernel over `w x h` pixels and reads the frame back.
    fn march(&self, bindings: &wgpu::BindGroup, frame: &wgpu::Buffer, w: u32, h: u32) -> MarchResult<Vec<f32>> {
        let bytes = frame.size();
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_readback"),
            size: bytes,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut commands = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("raymarch") });
        {
            let mut pass = commands.begin_compute_pass(&wgpu::ComputePassDescriptor::default());
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, bindings, &[]);
            pass.dispatch_workgroups(w.div_ceil(GROUP), h.div_ceil(GROUP), 1);
        }
        commands.copy_buffer_to_buffer(frame, 0, &readback, 0, bytes);
        self.queue.submit([commands.finish()]);

        let view = readback.slice(..);
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        view.map_async(wgpu::MapMode::Read, move |status| {
            let _ = done_tx.send(status);
        });
        self.device.poll(wgpu::Maintain::Wait);
        match done_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(MarchError::OperationFailed(format!("frame readback failed: {e}"))),
            Err(_) => return Err(MarchError::OperationFailed("frame readback dropped".into())),
        }

        let pixels = bytemuck::cast_slice::<u8, f32>(&view.get_mapped_range()).to_vec();
        readback.unmap();
        Ok(pixels)
    }
}

impl RenderBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn limits(&self) -> &GpuLimits {
        &self.limits
    }

    fn upload_volume(&self, atlas: &AtlasTexture, mask: &MaskTexture) -> MarchResult<Box<dyn VolumeHandle>> {
        let (width, height) = (atlas.width(), atlas.height());
        let atlas_bytes = atlas.size_bytes() as u64;
        if !(self.limits.fits_texture(width, height) && self.limits.fits_buffer(atlas_bytes)) {
            return Err(MarchError::TextureTooLarge { width, height, limit: self.limits.max_texture_dim });
        }
        let mask_bytes = mask_words(mask);
        let size_bytes = atlas_bytes + mask_bytes.len() as u64;
        debug!(width, height, size_bytes, "atlas resident on gpu");

        Ok(Box::new(WgpuVolume {
            atlas: self.texture_buffer("atlas", atlas.data()),
            mask: self.texture_buffer("mask", &mask_bytes),
            layout: atlas.layout(),
            generation: atlas.generation(),
            size_bytes,
        }))
    }

    fn update_volume(&self, handle: &mut dyn VolumeHandle, atlas: &AtlasTexture, mask: &MaskTexture) -> MarchResult<()> {
        let vol = resident_mut::<WgpuVolume>(handle, "wgpu")?;
        if vol.layout != atlas.layout() {
            return Err(MarchError::OperationFailed("layout changed; upload a new volume".into()));
        }
        self.queue.write_buffer(&vol.atlas, 0, atlas.data());
        self.queue.write_buffer(&vol.mask, 0, &mask_words(mask));
        vol.generation = atlas.generation();
        Ok(())
    }

    fn render(&self, volume: &dyn VolumeHandle, uniforms: &FrameUniforms) -> MarchResult<RenderedFrame> {
        let vol = resident::<WgpuVolume>(volume, "wgpu")?;
        let (w, h) = (uniforms.width, uniforms.height);
        if w == 0 || h == 0 {
            return Err(MarchError::InvalidViewport(w, h));
        }
        let frame_bytes = GpuLimits::frame_bytes(w, h);
        if !self.limits.fits_buffer(frame_bytes) {
            return Err(MarchError::TextureTooLarge { width: w, height: h, limit: self.limits.max_texture_dim });
        }
        trace!(w, h, generation = vol.generation, "gpu march");

        let params = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("march_params"),
            contents: bytemuck::bytes_of(&MarchParams::pack(uniforms, vol.layout)),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let frame = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame"),
            size: frame_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let resources = [&vol.atlas, &vol.mask, &frame, &params];
        let entries: Vec<wgpu::BindGroupEntry> = resources
            .iter()
            .zip(0u32..)
            .map(|(buffer, binding)| wgpu::BindGroupEntry { binding, resource: buffer.as_entire_binding() })
            .collect();
        let bindings = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("march_bindings"),
            layout: &self.pipeline.get_bind_group_layout(0),
            entries: &entries,
        });

        let pixels = self.march(&bindings, &frame, w, h)?;
        RenderedFrame::from_rgba(pixels, w, h)
    }
}

/// Memory budget for uploads: `VOLVIZ_GPU_MEMORY_MB` if set, otherwise a
/// guess from the adapter class, keeping a fifth in reserve.
fn usable_memory(kind: wgpu::DeviceType, max_buffer: u64) -> u64 {
    const MIB: u64 = 1 << 20;
    const GIB: u64 = 1 << 30;
    let forced = std::env::var("VOLVIZ_GPU_MEMORY_MB").ok().and_then(|v| v.trim().parse::<u64>().ok());
    if let Some(mb) = forced {
        return mb.saturating_mul(MIB);
    }
    let (floor, ceil) = match kind {
        wgpu::DeviceType::DiscreteGpu => (2 * GIB, 24 * GIB),
        wgpu::DeviceType::IntegratedGpu => (512 * MIB, 4 * GIB),
        wgpu::DeviceType::VirtualGpu => (GIB, 8 * GIB),
        _ => (256 * MIB, 2 * GIB),
    };
    max_buffer.saturating_mul(2).clamp(floor, ceil) / 5 * 4
}
