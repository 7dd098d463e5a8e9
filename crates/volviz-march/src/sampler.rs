//! Pseudo-3D sampling of a tile atlas.
//!
//! A texture-space position `p` in `[0, 1]³` maps to the two nearest
//! z-slices `floor(p.z * depth)` and the next one. Each slice is sampled
//! bilinearly inside its own tile (texel centers, clamped to the tile
//! edge) and the two results are blended by the fractional z offset. The
//! within-tile row is flipped so that +y in the volume is up in the image.

use glam::{Vec3, Vec4};
use volviz_core::TileLayout;

/// Borrowed atlas and mask bytes with their tiling.
#[derive(Clone, Copy)]
pub struct AtlasSampler<'a> {
    atlas: &'a [u8],
    mask: &'a [u8],
    layout: TileLayout,
}

impl<'a> AtlasSampler<'a> {
    /// `atlas` is RGBA8, `mask` is R8, both `atlas_width x atlas_height`.
    pub fn new(atlas: &'a [u8], mask: &'a [u8], layout: TileLayout) -> Self {
        Self { atlas, mask, layout }
    }

    /// Tiling being sampled.
    pub fn layout(&self) -> TileLayout {
        self.layout
    }

    #[inline]
    fn atlas_texel(&self, x: u32, y: u32) -> Vec4 {
        let i = (y as usize * self.layout.atlas_width() as usize + x as usize) * 4;
        match self.atlas.get(i..i + 4) {
            Some(t) => Vec4::new(t[0] as f32, t[1] as f32, t[2] as f32, t[3] as f32) / 255.0,
            None => Vec4::ZERO,
        }
    }

    #[inline]
    fn mask_texel(&self, x: u32, y: u32) -> f32 {
        let i = y as usize * self.layout.atlas_width() as usize + x as usize;
        self.mask.get(i).map_or(0.0, |&m| m as f32 / 255.0)
    }

    /// Bilinear fetch of slice `z` at within-tile coordinates `(s, t)`,
    /// `t = 0` being the tile's top row. Returns color and mask.
    fn fetch_slice(&self, z: u32, s: f32, t: f32) -> (Vec4, f32) {
        let tw = self.layout.tile_width;
        let th = self.layout.tile_height;
        let (ox, oy) = self.layout.tile_origin(z);

        let fx = (s * tw as f32 - 0.5).clamp(0.0, (tw - 1) as f32);
        let fy = (t * th as f32 - 0.5).clamp(0.0, (th - 1) as f32);
        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let x1 = (x0 + 1).min(tw - 1);
        let y1 = (y0 + 1).min(th - 1);
        let wx = fx - x0 as f32;
        let wy = fy - y0 as f32;

        let c00 = self.atlas_texel(ox + x0, oy + y0);
        let c10 = self.atlas_texel(ox + x1, oy + y0);
        let c01 = self.atlas_texel(ox + x0, oy + y1);
        let c11 = self.atlas_texel(ox + x1, oy + y1);
        let color = c00.lerp(c10, wx).lerp(c01.lerp(c11, wx), wy);

        let m00 = self.mask_texel(ox + x0, oy + y0);
        let m10 = self.mask_texel(ox + x1, oy + y0);
        let m01 = self.mask_texel(ox + x0, oy + y1);
        let m11 = self.mask_texel(ox + x1, oy + y1);
        let top = m00 + (m10 - m00) * wx;
        let bottom = m01 + (m11 - m01) * wx;
        (color, top + (bottom - top) * wy)
    }

    /// Masked color at texture-space `pos`; zero outside `[0, 1]³`.
    pub fn sample(&self, pos: Vec3, mask_alpha: f32) -> Vec4 {
        if pos.cmplt(Vec3::ZERO).any() || pos.cmpgt(Vec3::ONE).any() {
            return Vec4::ZERO;
        }
        let depth = self.layout.depth;
        // Keeps slice boundaries off exact integers.
        let z = pos.z * (depth as f32 + 0.0001);
        let zfloor = z.floor();
        let frac = z - zfloor;
        let z0 = (zfloor as u32).min(depth - 1);
        let z1 = (z0 + 1).min(depth - 1);

        let t = 1.0 - pos.y;
        let (c0, m0) = self.fetch_slice(z0, pos.x, t);
        let (c1, m1) = self.fetch_slice(z1, pos.x, t);

        let mask = m0 + (m1 - m0) * frac;
        let mask = mask + (1.0 - mask) * mask_alpha;
        let col = c0.lerp(c1, frac);
        Vec4::new(col.x * mask, col.y * mask, col.z * mask, col.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 2x2 tiles, depth 2, slice 0 red, slice 1 blue; top row of each tile brighter.
    fn fixture() -> (Vec<u8>, Vec<u8>, TileLayout) {
        let layout = TileLayout::new(2, 2, 2, 2, 1).unwrap();
        let mut atlas = vec![0u8; layout.atlas_pixels() * 4];
        for y in 0..layout.atlas_height() {
            for x in 0..layout.atlas_width() {
                let i = (y * layout.atlas_width() + x) as usize * 4;
                let v = if y == 0 { 255 } else { 100 };
                let ch = if layout.slice_at(x, y) == Some(0) { 0 } else { 2 };
                atlas[i + ch] = v;
                atlas[i + 3] = v;
            }
        }
        let mask = vec![255u8; layout.atlas_pixels()];
        (atlas, mask, layout)
    }

    #[test]
    fn test_outside_is_zero() {
        let (a, m, l) = fixture();
        let s = AtlasSampler::new(&a, &m, l);
        assert_eq!(s.sample(Vec3::new(1.1, 0.5, 0.5), 1.0), Vec4::ZERO);
        assert_eq!(s.sample(Vec3::new(0.5, -0.01, 0.5), 1.0), Vec4::ZERO);
    }

    #[test]
    fn test_first_slice_top_row() {
        let (a, m, l) = fixture();
        let s = AtlasSampler::new(&a, &m, l);
        // y = 1 is the top of the tile
        let c = s.sample(Vec3::new(0.1, 1.0, 0.0), 1.0);
        assert_relative_eq!(c.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(c.z, 0.0);
        let c = s.sample(Vec3::new(0.1, 0.0, 0.0), 1.0);
        assert_relative_eq!(c.x, 100.0 / 255.0, epsilon = 1e-5);

        // a fifth of the way to the next slice
        let c = s.sample(Vec3::new(0.1, 1.0, 0.1), 1.0);
        assert_relative_eq!(c.z / (c.x + c.z), 0.2, epsilon = 1e-3);
    }

    #[test]
    fn test_last_slice_clamps() {
        let (a, m, l) = fixture();
        let s = AtlasSampler::new(&a, &m, l);
        let c = s.sample(Vec3::new(0.5, 1.0, 1.0), 1.0);
        assert_relative_eq!(c.z, 1.0, epsilon = 1e-3);
        assert_relative_eq!(c.x, 0.0);
    }

    #[test]
    fn test_mask_only_scales_rgb() {
        let (a, _, l) = fixture();
        let zero_mask = vec![0u8; l.atlas_pixels()];
        let s = AtlasSampler::new(&a, &zero_mask, l);
        let c = s.sample(Vec3::new(0.5, 1.0, 0.1), 0.0);
        assert_relative_eq!(c.x, 0.0);
        assert!(c.w > 0.0);
        let half = s.sample(Vec3::new(0.5, 1.0, 0.1), 0.5);
        let full = AtlasSampler::new(&a, &[255; 4 * 2], l).sample(Vec3::new(0.5, 1.0, 0.1), 0.5);
        assert_relative_eq!(half.x * 2.0, full.x, epsilon = 1e-5);
    }
}
