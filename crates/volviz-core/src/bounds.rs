//! Axis-aligned clip box in normalized volume space.
//!
//! The volume occupies `[-0.5, 0.5]` on every axis. A [`ClipBounds`] is a
//! sub-box of that cube to which ray marching is restricted.
//!
//! ```text
//!   +0.5 ┌───────────────┐
//!        │   ┌───────┐   │
//!        │   │ clip  │   │
//!        │   └───────┘   │
//!   -0.5 └───────────────┘
//!      -0.5            +0.5
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{VolumeError, VolumeResult};

/// Half extent of the normalized volume cube.
pub const HALF_EXTENT: f32 = 0.5;

/// Volume axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// X axis.
    X,
    /// Y axis.
    Y,
    /// Z axis.
    Z,
}

impl Axis {
    /// Axis index (0, 1, 2).
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Axis from index.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::X),
            1 => Some(Self::Y),
            2 => Some(Self::Z),
            _ => None,
        }
    }
}

/// Clip box with `min <= max` per axis, inside `[-0.5, 0.5]³`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipBounds {
    min: Vec3,
    max: Vec3,
}

impl Default for ClipBounds {
    fn default() -> Self {
        Self::full()
    }
}

impl ClipBounds {
    /// The whole volume.
    pub fn full() -> Self {
        Self { min: Vec3::splat(-HALF_EXTENT), max: Vec3::splat(HALF_EXTENT) }
    }

    /// Builds a box, validating every axis.
    pub fn new(min: Vec3, max: Vec3) -> VolumeResult<Self> {
        let mut bounds = Self::full();
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let i = axis.index();
            bounds.set_axis(axis, min[i], max[i])?;
        }
        Ok(bounds)
    }

    /// Lower corner.
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// Upper corner.
    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// Sets one axis. Leaves the box untouched on error.
    pub fn set_axis(&mut self, axis: Axis, min: f32, max: f32) -> VolumeResult<()> {
        let range = -HALF_EXTENT..=HALF_EXTENT;
        if !(min <= max && range.contains(&min) && range.contains(&max)) {
            return Err(VolumeError::InvalidClip { axis: axis.index(), min, max });
        }
        let i = axis.index();
        self.min[i] = min;
        self.max[i] = max;
        Ok(())
    }

    /// Extent along one axis.
    pub fn thickness(&self, axis: Axis) -> f32 {
        let i = axis.index();
        self.max[i] - self.min[i]
    }

    /// Whether a point lies inside (inclusive).
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_axis_validates() {
        let mut b = ClipBounds::full();
        assert!(b.set_axis(Axis::Z, 0.2, -0.1).is_err());
        assert!(b.set_axis(Axis::Z, -0.6, 0.1).is_err());
        assert_eq!(b, ClipBounds::full());

        b.set_axis(Axis::Z, -0.1, 0.2).unwrap();
        assert!((b.thickness(Axis::Z) - 0.3).abs() < 1e-6);
        assert!(!b.contains(Vec3::new(0.0, 0.0, 0.3)));
    }

    #[test]
    fn test_new() {
        assert!(ClipBounds::new(Vec3::splat(0.1), Vec3::splat(0.0)).is_err());
        let b = ClipBounds::new(Vec3::splat(-0.25), Vec3::splat(0.25)).unwrap();
        assert!(b.contains(Vec3::ZERO));
    }
}
