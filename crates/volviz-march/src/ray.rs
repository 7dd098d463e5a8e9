//! Primary rays, box intersection and the per-pixel dither.
//!
//! These functions are mirrored line for line by the WGSL kernel so the
//! CPU and GPU backends agree.

use glam::{Vec3, Vec4, Vec4Swizzles};

use crate::FrameUniforms;

/// Ray in volume object space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin.
    pub origin: Vec3,
    /// Direction; not normalized for orthographic rays.
    pub dir: Vec3,
}

impl Ray {
    /// Point at parameter `t`.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Normalized pixel-center coordinates; `v` grows upward, row 0 is the top.
#[inline]
pub fn pixel_uv(px: u32, py: u32, width: u32, height: u32) -> (f32, f32) {
    let u = (px as f32 + 0.5) / width as f32;
    let v = 1.0 - (py as f32 + 0.5) / height as f32;
    (u, v)
}

/// Ray through pixel `(px, py)`.
pub fn primary_ray(uniforms: &FrameUniforms, px: u32, py: u32) -> Ray {
    let (u, v) = pixel_uv(px, py, uniforms.width, uniforms.height);
    let inv = uniforms.inverse_model_view;
    let aspect = uniforms.aspect();
    let nx = 2.0 * u - 1.0;
    let ny = 2.0 * v - 1.0;

    if uniforms.settings.orthographic {
        let dir = (inv * Vec4::new(0.0, 0.0, -2.0, 0.0)).xyz();
        let s = uniforms.settings.ortho_scale;
        let origin = (inv * Vec4::new(nx * s * aspect, ny * s, 1.0, 1.0)).xyz();
        Ray { origin, dir }
    } else {
        let origin = (inv * Vec4::new(0.0, 0.0, 0.0, 1.0)).xyz();
        let t = uniforms.tan_half_fov;
        let target = (inv * Vec4::new(nx * t * aspect, ny * t, -1.0, 1.0)).xyz();
        Ray { origin, dir: (target - origin).normalize_or_zero() }
    }
}

/// Slab test against an axis-aligned box.
///
/// Returns `(tnear, tfar)` when the ray hits, i.e. `tfar > tnear`.
pub fn intersect_box(ray: &Ray, box_min: Vec3, box_max: Vec3) -> Option<(f32, f32)> {
    let inv = Vec3::ONE / ray.dir;
    let tbot = inv * (box_min - ray.origin);
    let ttop = inv * (box_max - ray.origin);
    let tmin = ttop.min(tbot);
    let tmax = ttop.max(tbot);
    let tnear = tmin.x.max(tmin.y).max(tmin.z);
    let tfar = tmax.x.min(tmax.y).min(tmax.z);
    (tfar > tnear).then_some((tnear, tfar))
}

#[inline]
fn pcg_hash(v: u32) -> u32 {
    let state = v.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

/// Deterministic dither in `[0, 1)` for a pixel.
#[inline]
pub fn dither(px: u32, py: u32) -> f32 {
    let h = pcg_hash(px ^ pcg_hash(py));
    // 24 bits convert exactly on both backends
    (h >> 8) as f32 / 16_777_216.0
}
