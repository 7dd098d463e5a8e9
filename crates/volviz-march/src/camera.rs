//! Camera state and per-frame uniforms.

use glam::{Mat4, Vec3};

use crate::RenderSettings;

/// Camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// World to camera transform.
    pub view: Mat4,
    /// Vertical field of view in radians (perspective only).
    pub fov_y: f32,
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
}

impl CameraState {
    /// Camera at `eye` looking at `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3, fov_y: f32, width: u32, height: u32) -> Self {
        Self { view: Mat4::look_at_rh(eye, target, up), fov_y, width, height }
    }

    /// Width over height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::look_at(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO, Vec3::Y, 45f32.to_radians(), 256, 256)
    }
}

/// Everything a backend needs to shade one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    /// Camera space to volume object space.
    pub inverse_model_view: Mat4,
    /// Viewport width.
    pub width: u32,
    /// Viewport height.
    pub height: u32,
    /// `tan(fov_y / 2)`.
    pub tan_half_fov: f32,
    /// Integrator settings.
    pub settings: RenderSettings,
}

impl FrameUniforms {
    /// Resolves the camera against the volume's model transform.
    pub fn new(camera: &CameraState, model: Mat4, settings: RenderSettings) -> Self {
        Self {
            inverse_model_view: (camera.view * model).inverse(),
            width: camera.width,
            height: camera.height,
            tan_half_fov: (camera.fov_y * 0.5).tan(),
            settings,
        }
    }

    /// Width over height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inverse_model_view_recovers_eye() {
        let cam = CameraState::look_at(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y, 1.0, 10, 10);
        let u = FrameUniforms::new(&cam, Mat4::from_scale(Vec3::splat(2.0)), RenderSettings::default());
        let eye = u.inverse_model_view.transform_point3(Vec3::ZERO);
        // eye in object space is scaled down by the model transform
        assert_relative_eq!(eye.z, 1.5, epsilon = 1e-5);
    }
}
