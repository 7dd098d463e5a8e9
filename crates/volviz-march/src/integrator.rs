//! Host side of the ray-march integrator.
//!
//! [`RayMarchIntegrator`] owns the backend, the backend-resident volume
//! textures, the render settings and the volume's model transform. Fused
//! textures are uploaded once and then rewritten in place whenever their
//! generation changes.

use glam::{Mat4, Vec3};
#[allow(unused_imports)]
use tracing::{debug, info, trace};
use volviz_atlas::FusedTextures;

use crate::backend::{Backend, RenderBackend, VolumeHandle, create_backend};
use crate::{CameraState, FrameUniforms, MarchError, MarchResult, RenderSettings, RenderedFrame};

/// Ray-marched volume renderer.
pub struct RayMarchIntegrator {
    backend: Box<dyn RenderBackend>,
    volume: Option<Box<dyn VolumeHandle>>,
    settings: RenderSettings,
    model: Mat4,
    visible: bool,
}

impl RayMarchIntegrator {
    /// Creates an integrator on the requested backend.
    pub fn new(backend: Backend) -> MarchResult<Self> {
        Ok(Self::with_backend(create_backend(backend)?))
    }

    /// Creates an integrator on an existing backend.
    pub fn with_backend(backend: Box<dyn RenderBackend>) -> Self {
        info!(backend = backend.name(), "ray-march integrator created");
        Self {
            backend,
            volume: None,
            settings: RenderSettings::default(),
            model: Mat4::IDENTITY,
            visible: true,
        }
    }

    /// Active backend name.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Current settings.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Replaces the settings after validating them.
    pub fn set_settings(&mut self, settings: RenderSettings) -> MarchResult<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Mutable settings; validated again at render time.
    pub fn settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.settings
    }

    /// Volume object space to world transform.
    pub fn model_transform(&self) -> Mat4 {
        self.model
    }

    /// Sets the model transform.
    pub fn set_model_transform(&mut self, model: Mat4) {
        self.model = model;
    }

    /// Scales the unit volume box to its physical proportions.
    pub fn set_scale(&mut self, scale: Vec3) {
        self.model = Mat4::from_scale(scale);
    }

    /// Whether the volume node is drawn.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Shows or hides the volume node.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether textures are resident.
    pub fn has_volume(&self) -> bool {
        self.volume.is_some()
    }

    /// Bytes of backend memory held by the resident textures.
    pub fn resident_bytes(&self) -> u64 {
        self.volume.as_ref().map_or(0, |v| v.size_bytes())
    }

    /// Makes fused textures resident, reusing the existing allocation when
    /// the tiling is unchanged.
    pub fn upload(&mut self, textures: &FusedTextures) -> MarchResult<()> {
        let generation = textures.atlas.generation();
        if let Some(vol) = self.volume.as_deref_mut() {
            if vol.layout() == textures.atlas.layout() {
                if vol.generation() != generation {
                    trace!(generation, "updating resident textures");
                    self.backend.update_volume(vol, &textures.atlas, &textures.mask)?;
                }
                return Ok(());
            }
        }
        let limits = self.backend.limits();
        let (w, h) = (textures.atlas.width(), textures.atlas.height());
        if !limits.fits_texture(w, h) {
            return Err(MarchError::TextureTooLarge { width: w, height: h, limit: limits.max_texture_dim });
        }
        self.volume = Some(self.backend.upload_volume(&textures.atlas, &textures.mask)?);
        debug!(w, h, generation, "volume textures uploaded");
        Ok(())
    }

    /// Per-frame uniforms for a camera.
    pub fn frame_uniforms(&self, camera: &CameraState) -> FrameUniforms {
        FrameUniforms::new(camera, self.model, self.settings)
    }

    /// Renders one frame.
    pub fn render(&self, camera: &CameraState) -> MarchResult<RenderedFrame> {
        let volume = self.volume.as_deref().ok_or(MarchError::NoVolume)?;
        if camera.width == 0 || camera.height == 0 {
            return Err(MarchError::InvalidViewport(camera.width, camera.height));
        }
        self.settings.validate()?;
        self.backend.render(volume, &self.frame_uniforms(camera))
    }

    /// Releases the resident textures.
    pub fn cleanup(&mut self) {
        if self.volume.take().is_some() {
            debug!("volume textures released");
        }
    }
}

impl std::fmt::Debug for RayMarchIntegrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RayMarchIntegrator")
            .field("backend", &self.backend.name())
            .field("resident_bytes", &self.resident_bytes())
            .field("visible", &self.visible)
            .finish()
    }
}
