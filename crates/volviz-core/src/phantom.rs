//! Synthetic test volumes.
//!
//! Phantoms are ordered x-fastest, then y, then z, ready for
//! [`VolumeStore::set_channel_data_from_volume`](crate::VolumeStore::set_channel_data_from_volume).

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{VolumeError, VolumeResult};

/// Kind of synthetic volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phantom {
    /// Solid ball fading linearly toward its rim.
    #[default]
    Ball,
    /// Hollow spherical shell.
    Shell,
    /// Linear ramp along z.
    Gradient,
    /// Two overlapping balls, for multi-channel demos.
    Cells,
    /// Every voxel at full intensity.
    Uniform,
}

impl Phantom {
    /// All phantoms.
    pub const ALL: [Phantom; 5] = [Self::Ball, Self::Shell, Self::Gradient, Self::Cells, Self::Uniform];

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ball => "ball",
            Self::Shell => "shell",
            Self::Gradient => "gradient",
            Self::Cells => "cells",
            Self::Uniform => "uniform",
        }
    }

    /// Generates a `width × height × depth` volume.
    pub fn generate(self, width: u32, height: u32, depth: u32) -> Vec<u8> {
        let dims = Vec3::new(width as f32, height as f32, depth as f32);
        let mut out = Vec::with_capacity(width as usize * height as usize * depth as usize);
        for z in 0..depth {
            for y in 0..height {
                for x in 0..width {
                    // normalized [-1, 1] per axis, voxel centers
                    let p = (Vec3::new(x as f32, y as f32, z as f32) + 0.5) / dims * 2.0 - 1.0;
                    out.push(to_u8(self.value(p)));
                }
            }
        }
        out
    }

    fn value(self, p: Vec3) -> f32 {
        match self {
            Self::Ball => 1.0 - p.length() / 0.8,
            Self::Shell => 1.0 - (p.length() - 0.6).abs() / 0.15,
            Self::Gradient => (p.z + 1.0) * 0.5,
            Self::Cells => {
                let a = 1.0 - (p - Vec3::new(-0.3, 0.0, 0.0)).length() / 0.5;
                let b = 1.0 - (p - Vec3::new(0.35, 0.1, 0.0)).length() / 0.4;
                a.max(b)
            }
            Self::Uniform => 1.0,
        }
    }
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl fmt::Display for Phantom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Phantom {
    type Err = VolumeError;

    fn from_str(s: &str) -> VolumeResult<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| VolumeError::MalformedInput(format!("unknown phantom '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        for p in Phantom::ALL {
            assert_eq!(p.generate(5, 4, 3).len(), 60, "{p}");
        }
    }

    #[test]
    fn test_ball_peaks_at_center() {
        let v = Phantom::Ball.generate(9, 9, 9);
        let center = v[4 + 9 * 4 + 81 * 4];
        assert!(center > 240);
        assert_eq!(v[0], 0);
        assert_eq!(*v.iter().max().unwrap(), center);
    }

    #[test]
    fn test_shell_is_hollow() {
        let v = Phantom::Shell.generate(21, 21, 21);
        let at = |x: usize, y: usize, z: usize| v[x + 21 * y + 441 * z];
        assert_eq!(at(10, 10, 10), 0);
        assert!(at(10, 10, 16) > 100);
    }

    #[test]
    fn test_gradient_increases_along_z() {
        let v = Phantom::Gradient.generate(2, 2, 8);
        let slices: Vec<u8> = (0..8).map(|z| v[z * 4]).collect();
        assert!(slices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_parse() {
        assert_eq!("Shell".parse::<Phantom>().unwrap(), Phantom::Shell);
        assert_eq!(Phantom::Cells.to_string(), "cells");
        assert!("cube".parse::<Phantom>().is_err());
    }
}
