//! Transfer function and front-to-back integration.
//!
//! [`integrate_pixel`] is the reference implementation of the ray-march
//! kernel. The CPU backend calls it for every pixel; the WGSL kernel in
//! `shaders` follows the same steps.

use glam::{Vec3, Vec4};

use crate::ray::{dither, intersect_box, primary_ray};
use crate::sampler::AtlasSampler;
use crate::{FrameUniforms, MAX_STEPS, Ray, RenderSettings};

/// Color of one pixel plus the number of samples taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    /// Clamped RGBA.
    pub color: Vec4,
    /// Samples taken along the ray.
    pub steps: u32,
}

impl PixelSample {
    /// Fully transparent, no work done.
    pub const MISS: Self = Self { color: Vec4::ZERO, steps: 0 };
}

/// `pow` that returns 0 for a non-positive base.
#[inline]
fn pow0(base: f32, exp: f32) -> f32 {
    if base <= 0.0 { 0.0 } else { base.powf(exp) }
}

/// Opacity from the brightest color component.
///
/// `a = clamp((max(r, g, b) - gmin) / (gmax - gmin), 0, 1) ^ gscale`; an
/// empty window becomes a step at `gmin`.
#[inline]
pub fn transfer(color: Vec4, gamma_min: f32, gamma_max: f32, gamma_scale: f32) -> Vec4 {
    let x = color.x.max(color.y).max(color.z);
    let span = gamma_max - gamma_min;
    let xi = if span > 0.0 {
        ((x - gamma_min) / span).clamp(0.0, 1.0)
    } else if x >= gamma_min {
        1.0
    } else {
        0.0
    };
    let a = pow0(xi, gamma_scale).clamp(0.0, 1.0);
    Vec4::new(color.x, color.y, color.z, a)
}

/// Front-to-back "over" compositing with opacity correction exponent `s`.
#[inline]
pub fn accumulate(col: Vec4, s: f32, acc: Vec4) -> Vec4 {
    let a = 1.0 - pow0(1.0 - col.w, s);
    let col = Vec4::new(col.x * a, col.y * a, col.z * a, a).clamp(Vec4::ZERO, Vec4::ONE);
    col * (1.0 - acc.w) + acc
}

/// Maximum intensity projection; order independent.
#[inline]
pub fn accumulate_max(col: Vec4, acc: Vec4) -> Vec4 {
    let rgb = Vec3::new(col.x, col.y, col.z) * col.w;
    Vec4::new(acc.x.max(rgb.x), acc.y.max(rgb.y), acc.z.max(rgb.z), acc.w.max(col.w))
}

/// Marches one ray through the clip box.
///
/// `jitter` is the dither in `[0, 1)`; it is ignored for single-slice
/// volumes.
pub fn integrate_ray(ray: &Ray, settings: &RenderSettings, sampler: &AtlasSampler, jitter: f32) -> PixelSample {
    let clip = settings.clip;
    let Some((tnear, tfar)) = intersect_box(ray, clip.min(), clip.max()) else {
        return PixelSample::MISS;
    };

    let tbegin = tnear.max(settings.near_clip);
    let tend = tfar;
    let tstep = settings.step_length();
    let s = settings.opacity_exponent();

    let r = if sampler.layout().depth == 1 { 0.0 } else { 0.5 - jitter };
    let overflow = (r * tstep - tend).rem_euclid(tstep);
    let mut t = tbegin + overflow + r * tstep;

    let mut acc = Vec4::ZERO;
    let mut steps = 0;
    while steps < MAX_STEPS {
        // [-0.5, 0.5] box to [0, 1] texture space
        let pos = ray.at(t) + Vec3::splat(0.5);
        let col = sampler.sample(pos, settings.mask_alpha);
        let mut col = transfer(col, settings.gamma_min, settings.gamma_max, settings.gamma_scale);
        col.x *= settings.brightness;
        col.y *= settings.brightness;
        col.z *= settings.brightness;

        if settings.max_projection {
            acc = accumulate_max(col, acc);
        } else {
            col.w *= settings.density;
            acc = accumulate(col, s, acc);
        }
        steps += 1;
        t += tstep;

        if t > tend || t > tbegin + settings.far_clip {
            break;
        }
        if acc.w >= 1.0 {
            break;
        }
    }

    PixelSample { color: acc.clamp(Vec4::ZERO, Vec4::ONE), steps }
}

/// Full per-pixel kernel: ray construction, dither and integration.
pub fn integrate_pixel(uniforms: &FrameUniforms, sampler: &AtlasSampler, px: u32, py: u32) -> PixelSample {
    let ray = primary_ray(uniforms, px, py);
    integrate_ray(&ray, &uniforms.settings, sampler, dither(px, py))
}
