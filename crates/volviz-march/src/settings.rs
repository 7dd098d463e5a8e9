//! Render settings shared by every backend.
//!
//! [`RenderSettings`] holds the tunable part of the per-frame uniforms. The
//! defaults reproduce a freshly created volume: zero density and
//! brightness, an identity transfer window and 128 steps.
//!
//! # Example
//!
//! ```rust
//! use volviz_march::RenderSettings;
//!
//! let settings = RenderSettings { density: 0.5, brightness: 1.0, ..Default::default() };
//! assert!(settings.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use volviz_core::ClipBounds;

use crate::{MarchError, MarchResult};

/// Upper bound on ray-march steps per pixel.
pub const MAX_STEPS: u32 = 512;

/// Default far clip distance along the ray.
pub const DEFAULT_FAR_CLIP: f32 = 10000.0;

/// Tunable integrator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Opacity multiplier for front-to-back compositing.
    pub density: f32,
    /// Color multiplier applied to every sample.
    pub brightness: f32,
    /// Intensity mapped to zero opacity.
    pub gamma_min: f32,
    /// Intensity mapped to full opacity.
    pub gamma_max: f32,
    /// Exponent of the opacity ramp.
    pub gamma_scale: f32,
    /// Step budget, 1..=512.
    pub steps: u32,
    /// Mask blend: 1 ignores the mask, 0 applies it fully.
    pub mask_alpha: f32,
    /// Ray-march clip box.
    pub clip: ClipBounds,
    /// Rays start no earlier than this distance.
    pub near_clip: f32,
    /// Rays stop this far past their entry point.
    pub far_clip: f32,
    /// Orthographic instead of perspective rays.
    pub orthographic: bool,
    /// Ray length covered by the step budget in orthographic mode.
    pub ortho_thickness: f32,
    /// Half height of the orthographic view.
    pub ortho_scale: f32,
    /// Maximum intensity projection instead of compositing.
    pub max_projection: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            density: 0.0,
            brightness: 0.0,
            gamma_min: 0.0,
            gamma_max: 1.0,
            gamma_scale: 1.0,
            steps: 128,
            mask_alpha: 1.0,
            clip: ClipBounds::full(),
            near_clip: 0.0,
            far_clip: DEFAULT_FAR_CLIP,
            orthographic: false,
            ortho_thickness: 1.0,
            ortho_scale: 0.5,
            max_projection: false,
        }
    }
}

impl RenderSettings {
    /// Rejects settings the integrator cannot honor.
    pub fn validate(&self) -> MarchResult<()> {
        let bad = |msg: String| Err(MarchError::InvalidSettings(msg));
        if !(1..=MAX_STEPS).contains(&self.steps) {
            return bad(format!("steps {} outside 1..={MAX_STEPS}", self.steps));
        }
        if !(0.0..=1.0).contains(&self.mask_alpha) {
            return bad(format!("mask alpha {} outside [0, 1]", self.mask_alpha));
        }
        if !(self.density >= 0.0) {
            return bad(format!("negative density {}", self.density));
        }
        if !(self.gamma_scale > 0.0) {
            return bad(format!("gamma scale {} must be positive", self.gamma_scale));
        }
        // only orthographic rays read thickness and scale
        if self.orthographic && !(self.ortho_thickness > 0.0 && self.ortho_scale > 0.0) {
            return bad("orthographic thickness and scale must be positive".into());
        }
        if !(self.far_clip > 0.0) {
            return bad(format!("far clip {} must be positive", self.far_clip));
        }
        // Deserialized boxes bypass ClipBounds::set_axis.
        ClipBounds::new(self.clip.min(), self.clip.max())
            .map_err(|e| MarchError::InvalidSettings(e.to_string()))?;
        Ok(())
    }

    /// Step budget clamped to the supported range.
    pub fn clamped_steps(&self) -> u32 {
        self.steps.clamp(1, MAX_STEPS)
    }

    /// Step length along the ray.
    pub fn step_length(&self) -> f32 {
        let thickness = if self.orthographic { self.ortho_thickness } else { 1.0 };
        thickness / self.clamped_steps() as f32
    }

    /// Opacity correction exponent `0.5 * 512 / steps`.
    pub fn opacity_exponent(&self) -> f32 {
        0.5 * MAX_STEPS as f32 / self.clamped_steps() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_valid() {
        let s = RenderSettings::default();
        s.validate().unwrap();
        assert_relative_eq!(s.step_length(), 1.0 / 128.0);
        assert_relative_eq!(s.opacity_exponent(), 2.0);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let s = RenderSettings { steps: 0, ..Default::default() };
        assert!(s.validate().is_err());
        let s = RenderSettings { steps: 513, ..Default::default() };
        assert!(s.validate().is_err());
        let s = RenderSettings { mask_alpha: 1.5, ..Default::default() };
        assert!(s.validate().is_err());
        let s = RenderSettings { density: -0.1, ..Default::default() };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_ortho_extent_checked_only_when_orthographic() {
        let flat = RenderSettings { ortho_thickness: 0.0, ..Default::default() };
        flat.validate().unwrap();
        assert_relative_eq!(flat.step_length(), 1.0 / 128.0);
        let flat_ortho = RenderSettings { orthographic: true, ..flat };
        assert!(flat_ortho.validate().is_err());
    }

    #[test]
    fn test_empty_gamma_window_is_accepted() {
        RenderSettings { gamma_min: 0.5, gamma_max: 0.5, ..Default::default() }.validate().unwrap();
        RenderSettings { gamma_min: 0.8, gamma_max: 0.2, ..Default::default() }.validate().unwrap();
        let s = RenderSettings { gamma_scale: 0.0, ..Default::default() };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_ortho_step_uses_thickness() {
        let s = RenderSettings { orthographic: true, ortho_thickness: 0.25, steps: 64, ..Default::default() };
        assert_relative_eq!(s.step_length(), 0.25 / 64.0);
    }
}
