//! Read-only view of a channel as a scalar field.

use glam::Vec3;
use volviz_core::{Channel, TileLayout, VolumeError};

use crate::IsoResult;

/// 8-bit scalar field of `dims[0] x dims[1] x dims[2]` samples, x-fastest.
///
/// Voxel `(i, j, k)` sits at the centre of its cell in the object space
/// cube `[-0.5, 0.5]³`; the y axis is flipped so that image row 0 is the
/// top of the volume, matching the ray-marched view.
#[derive(Debug, Clone, Copy)]
pub struct ScalarField<'a> {
    data: &'a [u8],
    dims: [usize; 3],
}

impl<'a> ScalarField<'a> {
    /// Wraps a buffer, checking its length against the dimensions.
    pub fn new(data: &'a [u8], dims: [usize; 3]) -> IsoResult<Self> {
        let expected = dims.iter().product();
        if data.len() != expected {
            return Err(VolumeError::BufferSizeMismatch { expected, actual: data.len() }.into());
        }
        Ok(Self { data, dims })
    }

    /// A field with no samples.
    pub fn empty() -> Self {
        Self { data: &[], dims: [0; 3] }
    }

    /// Field of a channel; unloaded channels give an empty field.
    pub fn from_channel(channel: &'a Channel, layout: &TileLayout) -> IsoResult<Self> {
        if !channel.is_loaded() {
            return Ok(Self::empty());
        }
        let dims = [layout.tile_width as usize, layout.tile_height as usize, layout.depth as usize];
        Self::new(channel.data(), dims)
    }

    /// Samples per axis.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Whether no cell can be formed.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.dims.iter().any(|&d| d < 2)
    }

    /// Sample value.
    #[inline]
    pub fn value(&self, x: usize, y: usize, z: usize) -> f32 {
        let [w, h, _] = self.dims;
        self.data[x + y * w + z * w * h] as f32
    }

    /// Central difference gradient in voxel units, one-sided at the border.
    pub fn gradient(&self, x: usize, y: usize, z: usize) -> Vec3 {
        let p = [x, y, z];
        let axis = |a: usize| {
            let lo = p[a].saturating_sub(1);
            let hi = (p[a] + 1).min(self.dims[a] - 1);
            if hi == lo {
                return 0.0;
            }
            let mut q0 = p;
            let mut q1 = p;
            q0[a] = lo;
            q1[a] = hi;
            (self.value(q1[0], q1[1], q1[2]) - self.value(q0[0], q0[1], q0[2])) / (hi - lo) as f32
        };
        Vec3::new(axis(0), axis(1), axis(2))
    }

    /// Object-space position of a point in voxel coordinates.
    pub fn to_object(&self, p: Vec3) -> Vec3 {
        let d = self.extent();
        let t = (p + 0.5) / d - 0.5;
        Vec3::new(t.x, -t.y, t.z)
    }

    /// Outward object-space normal from a voxel-space gradient.
    ///
    /// Intensity grows towards the inside, so the normal opposes the
    /// gradient.
    pub fn normal_to_object(&self, gradient: Vec3) -> Vec3 {
        let d = self.extent();
        let g = gradient * d;
        (-Vec3::new(g.x, -g.y, g.z)).normalize_or_zero()
    }

    fn extent(&self) -> Vec3 {
        Vec3::new(self.dims[0] as f32, self.dims[1] as f32, self.dims[2] as f32)
    }
}
