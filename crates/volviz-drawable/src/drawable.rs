//! The volume drawable facade.
//!
//! Holds one image's channels, their display state, the fused textures,
//! the ray-march integrator and the isosurfaces. Channel data arrives one
//! batch at a time; each batch is fused immediately and isosurfaces of the
//! affected channels are rebuilt at their current isovalues.

use glam::Vec3;
#[allow(unused_imports)]
use tracing::{debug, info, trace, warn};
use volviz_atlas::{AtlasFuser, CombineMode, FuseError, FusedTextures, FusionEntry};
use volviz_core::{Axis, ChannelBatch, ChannelColor, IntensityLut, Rgb8, VolumeInfo, VolumeStore, color_for_channel};
use volviz_iso::{ExtractionMethod, IsosurfaceManager, IsosurfaceSnapshot};
use volviz_march::{CameraState, MAX_STEPS, RayMarchIntegrator, RenderSettings, RenderedFrame};

use crate::scene::{MeshGroupNode, MeshNode, VolumeNode, volume_transform};
use crate::{DrawableConfig, DrawableResult};

/// Thinnest orthographic slab an axis clip can produce.
pub const MIN_ORTHO_THICKNESS: f32 = 1e-3;

/// A renderable multi-channel volume image.
pub struct VolumeDrawable {
    store: VolumeStore,
    /// Last color per channel, kept while the channel is disabled.
    colors: Vec<Rgb8>,
    fusion: Vec<FusionEntry>,
    mask_channel: Option<usize>,
    combine_mode: CombineMode,
    fuser: AtlasFuser,
    integrator: RayMarchIntegrator,
    surfaces: IsosurfaceManager,
    max_steps: u32,
}

impl VolumeDrawable {
    /// Creates a drawable for an image whose data has not arrived yet.
    pub fn new(info: VolumeInfo, config: DrawableConfig) -> DrawableResult<Self> {
        let colors: Vec<Rgb8> = (0..info.channel_names.len()).map(|i| info.initial_color(i)).collect();
        let fusion = colors
            .iter()
            .enumerate()
            .map(|(i, &c)| FusionEntry::new(i, ChannelColor::from_initial(c)))
            .collect();
        let store = VolumeStore::new(info)?;

        let mut integrator = RayMarchIntegrator::new(config.backend)?;
        integrator.set_settings(config.render)?;
        integrator.set_scale(store.scale());

        info!(
            name = store.name(),
            channels = store.channel_count(),
            backend = integrator.backend_name(),
            "volume drawable created"
        );
        let mut drawable = Self {
            store,
            colors,
            fusion,
            mask_channel: None,
            combine_mode: config.combine_mode,
            fuser: AtlasFuser::new(),
            integrator,
            surfaces: IsosurfaceManager::new(config.extraction),
            max_steps: config.max_steps.clamp(1, MAX_STEPS),
        };
        drawable.update_visibility();
        Ok(drawable)
    }

    // ---- channels ----

    /// Channel store.
    pub fn store(&self) -> &VolumeStore {
        &self.store
    }

    /// Image name.
    pub fn name(&self) -> &str {
        self.store.name()
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.store.channel_count()
    }

    /// Channel names in index order.
    pub fn channel_names(&self) -> Vec<&str> {
        self.store.channels().iter().map(|c| c.name()).collect()
    }

    /// Current color of a channel, whether or not it is enabled.
    pub fn channel_color(&self, channel: usize) -> Option<Rgb8> {
        self.colors.get(channel).copied()
    }

    /// Fusion state, one entry per channel.
    pub fn fusion_entries(&self) -> &[FusionEntry] {
        &self.fusion
    }

    /// Assigns channel data ordered x-fastest, then y, then z.
    pub fn set_channel_data_from_volume(&mut self, channel: usize, data: &[u8]) -> DrawableResult<()> {
        let batch = self.store.set_channel_data_from_volume(channel, data)?;
        self.on_channel_loaded(&batch);
        Ok(())
    }

    /// Assigns channel data from a tile atlas.
    pub fn set_channel_data_from_atlas(
        &mut self,
        channel: usize,
        atlas: &[u8],
        atlas_width: u32,
        atlas_height: u32,
    ) -> DrawableResult<()> {
        let batch = self.store.set_channel_data_from_atlas(channel, atlas, atlas_width, atlas_height)?;
        self.on_channel_loaded(&batch);
        Ok(())
    }

    /// Reacts to newly arrived channel data: re-fuses, then rebuilds the
    /// isosurfaces of the loaded channels at their current isovalues.
    pub fn on_channel_loaded(&mut self, batch: &ChannelBatch) {
        debug!(?batch, "channel data ready");
        self.fuse();
        if let Err(e) = self.surfaces.on_channel_data(&self.store, batch) {
            warn!(error = %e, "isosurface rebuild failed");
        }
    }

    /// Declares a new empty channel; the color defaults to the palette.
    pub fn append_empty_channel(&mut self, name: impl Into<String>, color: Option<Rgb8>) -> usize {
        let index = self.store.append_empty_channel(name);
        let color = color.unwrap_or_else(|| color_for_channel(index));
        self.colors.push(color);
        self.fusion.push(FusionEntry::new(index, ChannelColor::Enabled(color)));
        self.update_visibility();
        index
    }

    /// Shows or hides a channel in the volume. The volume node is hidden
    /// while every channel is disabled.
    pub fn set_volume_channel_enabled(&mut self, channel: usize, enabled: bool) {
        let Some(&color) = self.colors.get(channel) else {
            warn!(channel, "set_volume_channel_enabled: no such channel");
            return;
        };
        let state = if enabled { ChannelColor::Enabled(color) } else { ChannelColor::Disabled };
        if self.fusion[channel].color == state {
            return;
        }
        self.fusion[channel].color = state;
        self.update_visibility();
        self.fuse();
    }

    /// Whether a channel is shown in the volume.
    pub fn is_volume_channel_enabled(&self, channel: usize) -> bool {
        self.fusion.get(channel).is_some_and(|e| e.color.is_enabled())
    }

    /// Sets a channel's color. Enabled channels are re-fused; the channel's
    /// isosurface is recolored either way.
    pub fn update_channel_color(&mut self, channel: usize, color: Rgb8) {
        let Some(slot) = self.colors.get_mut(channel) else {
            warn!(channel, "update_channel_color: no such channel");
            return;
        };
        *slot = color;
        if self.fusion[channel].color.is_enabled() {
            self.fusion[channel].color = ChannelColor::Enabled(color);
            self.fuse();
        }
        self.surfaces.recolor(channel, color);
    }

    /// Like [`update_channel_color`](Self::update_channel_color) from raw
    /// components; fewer than three are ignored.
    pub fn update_channel_color_from_slice(&mut self, channel: usize, rgb: &[u8]) {
        match Rgb8::from_slice(rgb) {
            Ok(color) => self.update_channel_color(channel, color),
            Err(e) => warn!(channel, error = %e, "ignoring channel color"),
        }
    }

    /// Sets or clears a channel's intensity LUT.
    pub fn set_channel_lut(&mut self, channel: usize, lut: Option<IntensityLut>) {
        let Some(entry) = self.fusion.get_mut(channel) else {
            warn!(channel, "set_channel_lut: no such channel");
            return;
        };
        entry.lut = lut;
        self.fuse();
    }

    /// Designates the channel multiplied against the whole volume, or none.
    pub fn set_channel_as_mask(&mut self, channel: Option<usize>) {
        if let Some(c) = channel {
            if c >= self.channel_count() {
                warn!(channel = c, "set_channel_as_mask: no such channel");
                return;
            }
        }
        self.mask_channel = channel;
        self.fuse();
    }

    /// Mask channel, if any.
    pub fn mask_channel(&self) -> Option<usize> {
        self.mask_channel
    }

    /// Channel combine rule.
    pub fn combine_mode(&self) -> CombineMode {
        self.combine_mode
    }

    /// Changes the combine rule and re-fuses.
    pub fn set_combine_mode(&mut self, mode: CombineMode) {
        if self.combine_mode != mode {
            self.combine_mode = mode;
            self.fuse();
        }
    }

    /// Result of the last fusion pass.
    pub fn fused_textures(&self) -> Option<&FusedTextures> {
        self.fuser.textures()
    }

    /// Re-fuses every channel into the atlas and uploads it.
    ///
    /// Does nothing before the tile layout is known.
    pub fn fuse(&mut self) {
        let textures = match self.fuser.fuse(&self.fusion, &self.store, self.combine_mode, self.mask_channel) {
            Ok(t) => t,
            Err(FuseError::NotInitialized) => {
                debug!("fuse skipped: volume not initialized");
                return;
            }
            Err(e) => {
                warn!(error = %e, "fuse failed");
                return;
            }
        };
        if let Err(e) = self.integrator.upload(textures) {
            warn!(error = %e, "atlas upload failed");
        }
    }

    // ---- geometry ----

    /// Physical voxel size; needs three components, non-positive ones are
    /// ignored.
    pub fn set_voxel_size(&mut self, values: &[f32]) {
        match self.store.set_voxel_size(values) {
            Ok(scale) => self.integrator.set_scale(scale),
            Err(e) => warn!(error = %e, "ignoring voxel size"),
        }
    }

    /// Volume box scale.
    pub fn scale(&self) -> Vec3 {
        self.store.scale()
    }

    /// Restricts ray marching along one axis. On the orthographic view
    /// axis the slab width also becomes the ortho thickness, never less
    /// than [`MIN_ORTHO_THICKNESS`].
    pub fn set_axis_clip(&mut self, axis: Axis, min: f32, max: f32, is_ortho_axis: bool) {
        let mut next = *self.settings();
        if let Err(e) = next.clip.set_axis(axis, min, max) {
            warn!(error = %e, "ignoring axis clip");
            return;
        }
        if is_ortho_axis {
            next.ortho_thickness = (max - min).max(MIN_ORTHO_THICKNESS);
        }
        self.commit_settings(next, "axis clip");
    }

    // ---- render settings ----

    /// Integrator settings.
    pub fn settings(&self) -> &RenderSettings {
        self.integrator.settings()
    }

    /// Replaces the integrator settings; invalid settings are ignored.
    pub fn set_settings(&mut self, settings: RenderSettings) {
        self.commit_settings(settings, "render settings");
    }

    /// Opacity multiplier.
    pub fn density(&self) -> f32 {
        self.settings().density
    }

    /// Sets the opacity multiplier; negative values are ignored.
    pub fn set_density(&mut self, density: f32) {
        self.commit_settings(RenderSettings { density, ..*self.settings() }, "density");
    }

    /// Intensity multiplier.
    pub fn brightness(&self) -> f32 {
        self.settings().brightness
    }

    /// Sets the intensity multiplier.
    pub fn set_brightness(&mut self, brightness: f32) {
        self.commit_settings(RenderSettings { brightness, ..*self.settings() }, "brightness");
    }

    /// Sets the opacity transfer window and exponent. A non-positive
    /// exponent is ignored; an empty window is a step at `min`.
    pub fn set_gamma(&mut self, min: f32, max: f32, scale: f32) {
        let next = RenderSettings { gamma_min: min, gamma_max: max, gamma_scale: scale, ..*self.settings() };
        self.commit_settings(next, "transfer window");
    }

    /// Mask blend: 1 ignores the mask, 0 applies it fully.
    pub fn set_mask_alpha(&mut self, alpha: f32) {
        let mask_alpha = alpha.clamp(0.0, 1.0);
        self.commit_settings(RenderSettings { mask_alpha, ..*self.settings() }, "mask alpha");
    }

    /// Switches between compositing and maximum intensity projection.
    pub fn set_max_projection(&mut self, enabled: bool) {
        self.integrator.settings_mut().max_projection = enabled;
    }

    /// Switches between perspective and orthographic rays. A thickness or
    /// scale left unusable by perspective mode falls back to the default.
    pub fn set_orthographic(&mut self, enabled: bool) {
        let mut next = RenderSettings { orthographic: enabled, ..*self.settings() };
        let defaults = RenderSettings::default();
        if !(next.ortho_thickness > 0.0) {
            next.ortho_thickness = defaults.ortho_thickness;
        }
        if !(next.ortho_scale > 0.0) {
            next.ortho_scale = defaults.ortho_scale;
        }
        self.commit_settings(next, "projection mode");
    }

    /// Half height of the orthographic view; non-positive values are ignored.
    pub fn set_ortho_scale(&mut self, scale: f32) {
        if scale > 0.0 {
            self.integrator.settings_mut().ortho_scale = scale;
        } else {
            warn!(scale, "ignoring orthographic scale");
        }
    }

    /// Ray length covered by the step budget in orthographic mode.
    pub fn set_ortho_thickness(&mut self, thickness: f32) {
        if thickness > 0.0 {
            self.integrator.settings_mut().ortho_thickness = thickness;
        } else {
            warn!(thickness, "ignoring orthographic thickness");
        }
    }

    /// Applies `next` only if the integrator accepts it, so a rejected
    /// value never reaches `render`.
    fn commit_settings(&mut self, next: RenderSettings, what: &str) {
        match next.validate() {
            Ok(()) => *self.integrator.settings_mut() = next,
            Err(e) => warn!(error = %e, "ignoring {what}"),
        }
    }

    /// Sample-rate ceiling.
    pub fn max_sample_rate(&self) -> u32 {
        self.max_steps
    }

    /// Sets the sample-rate ceiling and uses it as the step budget.
    pub fn set_max_sample_rate(&mut self, steps: u32) {
        self.max_steps = steps.clamp(1, MAX_STEPS);
        self.integrator.settings_mut().steps = self.max_steps;
    }

    /// Drops the step budget to half the ceiling.
    pub fn reset_sample_rate(&mut self) {
        self.integrator.settings_mut().steps = (self.max_steps / 2).max(1);
    }

    /// Current step budget.
    pub fn sample_rate(&self) -> u32 {
        self.settings().steps
    }

    // ---- isosurfaces ----

    /// Isosurface algorithm.
    pub fn extraction_method(&self) -> ExtractionMethod {
        self.surfaces.method()
    }

    /// Algorithm used for surfaces created from now on.
    pub fn set_extraction_method(&mut self, method: ExtractionMethod) {
        self.surfaces.set_method(method);
    }

    /// Creates a channel's isosurface unless it already has one.
    pub fn create_isosurface(&mut self, channel: usize, isovalue: f32, opacity: Option<f32>, transparent: Option<bool>) {
        let Some(&color) = self.colors.get(channel) else {
            warn!(channel, "create_isosurface: no such channel");
            return;
        };
        if let Err(e) = self.surfaces.create_isosurface(&self.store, channel, isovalue, color, opacity, transparent) {
            warn!(channel, error = %e, "create_isosurface failed");
        }
    }

    /// Re-extracts a channel's isosurface at a new isovalue.
    pub fn update_isovalue(&mut self, channel: usize, isovalue: f32) {
        if let Err(e) = self.surfaces.update_isovalue(&self.store, channel, isovalue) {
            warn!(channel, error = %e, "update_isovalue failed");
        }
    }

    /// Isovalue of a channel's isosurface.
    pub fn isovalue(&self, channel: usize) -> Option<f32> {
        self.surfaces.isovalue(channel)
    }

    /// Sets an isosurface's opacity.
    pub fn update_opacity(&mut self, channel: usize, opacity: f32) {
        self.surfaces.update_opacity(channel, opacity);
    }

    /// Whether a channel has an isosurface.
    pub fn has_isosurface(&self, channel: usize) -> bool {
        self.surfaces.has_isosurface(channel)
    }

    /// Releases a channel's isosurface.
    pub fn destroy_isosurface(&mut self, channel: usize) {
        self.surfaces.destroy_isosurface(channel);
    }

    /// Export copy of a channel's isosurface, named `<image>_<channel>`.
    pub fn isosurface_snapshot(&self, channel: usize) -> Option<IsosurfaceSnapshot> {
        self.surfaces.snapshot(&self.store, channel)
    }

    // ---- scene ----

    /// The volume node.
    pub fn volume_node(&self) -> VolumeNode {
        VolumeNode {
            name: VolumeNode::NAME,
            visible: self.integrator.is_visible(),
            transform: self.integrator.model_transform(),
        }
    }

    /// The isosurface container node.
    pub fn mesh_group(&self) -> MeshGroupNode<'_> {
        let children = self
            .surfaces
            .channels()
            .filter_map(|channel| {
                let s = self.surfaces.surface(channel)?;
                Some(MeshNode {
                    name: format!("Channel{channel}"),
                    channel,
                    isovalue: s.isovalue(),
                    mesh: s.mesh(),
                    material: *s.material(),
                })
            })
            .collect();
        MeshGroupNode { name: MeshGroupNode::NAME, transform: volume_transform(self.scale()), children }
    }

    /// Renders the volume for a camera.
    ///
    /// `None` while the volume node is hidden or nothing has been fused.
    pub fn render(&self, camera: &CameraState) -> DrawableResult<Option<RenderedFrame>> {
        if !self.integrator.is_visible() || !self.integrator.has_volume() {
            return Ok(None);
        }
        Ok(Some(self.integrator.render(camera)?))
    }

    /// Releases textures and isosurfaces.
    pub fn cleanup(&mut self) {
        self.surfaces.cleanup();
        self.integrator.cleanup();
        self.fuser.cleanup();
        debug!(name = self.store.name(), "volume drawable cleaned up");
    }

    fn update_visibility(&mut self) {
        let visible = self.fusion.iter().any(|e| e.color.is_enabled());
        if visible != self.integrator.is_visible() {
            debug!(visible, "volume visibility changed");
        }
        self.integrator.set_visible(visible);
    }
}

impl std::fmt::Debug for VolumeDrawable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeDrawable")
            .field("name", &self.store.name())
            .field("channels", &self.store.channel_count())
            .field("mask_channel", &self.mask_channel)
            .field("combine_mode", &self.combine_mode)
            .field("integrator", &self.integrator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volviz_core::TileLayout;

    fn drawable() -> VolumeDrawable {
        let layout = TileLayout::packed(4, 4, 4).unwrap();
        let info = VolumeInfo::new("img", layout, vec!["a".into(), "b".into()]);
        VolumeDrawable::new(info, DrawableConfig::cpu()).unwrap()
    }

    #[test]
    fn test_sample_rate() {
        let mut d = drawable();
        assert_eq!(d.sample_rate(), 128);
        d.reset_sample_rate();
        assert_eq!(d.sample_rate(), 128);
        d.set_max_sample_rate(300);
        assert_eq!(d.sample_rate(), 300);
        d.reset_sample_rate();
        assert_eq!(d.sample_rate(), 150);
        d.set_max_sample_rate(10_000);
        assert_eq!(d.max_sample_rate(), MAX_STEPS);
    }

    #[test]
    fn test_axis_clip_sets_ortho_thickness() {
        let mut d = drawable();
        d.set_axis_clip(Axis::Z, -0.1, 0.3, true);
        assert!((d.settings().ortho_thickness - 0.4).abs() < 1e-6);
        d.set_axis_clip(Axis::X, -0.2, 0.2, false);
        assert!((d.settings().ortho_thickness - 0.4).abs() < 1e-6);
        assert_eq!(d.settings().clip.min().x, -0.2);
        // rejected: min > max
        d.set_axis_clip(Axis::Y, 0.3, 0.1, true);
        assert_eq!(d.settings().clip.min().y, -0.5);
    }

    #[test]
    fn test_setters_never_leave_invalid_settings() {
        let mut d = drawable();
        d.set_axis_clip(Axis::X, 0.2, 0.2, true);
        d.set_gamma(0.0, 1.0, -1.0);
        d.set_gamma(0.2, 0.4, f32::NAN);
        d.set_mask_alpha(f32::NAN);
        d.set_density(f32::NAN);
        d.set_ortho_scale(0.0);
        d.set_ortho_thickness(-1.0);
        d.set_orthographic(true);
        d.settings().validate().unwrap();
        assert_eq!(d.settings().mask_alpha, 1.0);
        assert!(d.settings().ortho_thickness > 0.0);
    }

    #[test]
    fn test_orthographic_repairs_unused_thickness() {
        let mut d = drawable();
        d.set_settings(RenderSettings { ortho_thickness: 0.0, ..Default::default() });
        assert_eq!(d.settings().ortho_thickness, 0.0);
        d.set_orthographic(true);
        assert!(d.settings().orthographic);
        assert_eq!(d.settings().ortho_thickness, 1.0);
    }

    #[test]
    fn test_malformed_input_is_ignored() {
        let mut d = drawable();
        let before = d.scale();
        d.set_voxel_size(&[2.0]);
        assert_eq!(d.scale(), before);
        let color = d.channel_color(0);
        d.update_channel_color_from_slice(0, &[1, 2]);
        assert_eq!(d.channel_color(0), color);
        d.set_density(-1.0);
        assert_eq!(d.density(), 0.0);
    }

    #[test]
    fn test_invalid_channel_is_noop() {
        let mut d = drawable();
        d.set_volume_channel_enabled(9, false);
        d.update_channel_color(9, Rgb8::new(1, 1, 1));
        d.create_isosurface(9, 10.0, None, None);
        d.set_channel_as_mask(Some(9));
        assert!(!d.has_isosurface(9));
        assert_eq!(d.mask_channel(), None);
    }

    #[test]
    fn test_append_channel_uses_palette() {
        let mut d = drawable();
        let i = d.append_empty_channel("c", None);
        assert_eq!(i, 2);
        assert_eq!(d.channel_color(2), Some(color_for_channel(2)));
        assert_eq!(d.fusion_entries().len(), d.channel_count());
        assert!(d.is_volume_channel_enabled(2));
    }
}
