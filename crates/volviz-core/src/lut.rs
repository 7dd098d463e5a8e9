//! 256-entry intensity lookup table.
//!
//! Maps a raw 8-bit intensity to a display intensity before fusion. An
//! absent LUT behaves like [`IntensityLut::identity`].
//!
//! # Example
//!
//! ```rust
//! use volviz_core::IntensityLut;
//!
//! let lut = IntensityLut::window(64, 192);
//! assert_eq!(lut.apply(32), 0);
//! assert_eq!(lut.apply(200), 255);
//! ```

use serde::{Deserialize, Serialize};

use crate::{VolumeError, VolumeResult};

/// Number of entries in an [`IntensityLut`].
pub const LUT_SIZE: usize = 256;

/// Raw intensity to display intensity mapping.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityLut {
    entries: Vec<u8>,
}

impl IntensityLut {
    /// Pass-through table.
    pub fn identity() -> Self {
        Self { entries: (0..=255u8).collect() }
    }

    /// Linear ramp from `lo` (maps to 0) to `hi` (maps to 255).
    pub fn window(lo: u8, hi: u8) -> Self {
        let lo_f = lo as f32;
        let span = (hi as f32 - lo_f).max(1.0);
        let entries = (0..LUT_SIZE)
            .map(|i| (((i as f32 - lo_f) / span).clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();
        Self { entries }
    }

    /// Builds a table from exactly 256 entries.
    pub fn from_entries(entries: &[u8]) -> VolumeResult<Self> {
        if entries.len() != LUT_SIZE {
            return Err(VolumeError::MalformedInput(format!(
                "lookup table needs {LUT_SIZE} entries, got {}",
                entries.len()
            )));
        }
        Ok(Self { entries: entries.to_vec() })
    }

    /// Looks up one intensity.
    #[inline]
    pub fn apply(&self, value: u8) -> u8 {
        self.entries[value as usize]
    }

    /// Table entries.
    pub fn entries(&self) -> &[u8] {
        &self.entries
    }
}

impl Default for IntensityLut {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::fmt::Debug for IntensityLut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let identity = self.entries.iter().enumerate().all(|(i, &v)| i == v as usize);
        f.debug_struct("IntensityLut").field("identity", &identity).finish()
    }
}

/// Applies an optional table.
#[inline]
pub fn map_intensity(lut: Option<&IntensityLut>, value: u8) -> u8 {
    lut.map_or(value, |l| l.apply(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let lut = IntensityLut::identity();
        for v in [0u8, 1, 127, 255] {
            assert_eq!(lut.apply(v), v);
        }
        assert_eq!(map_intensity(None, 42), 42);
    }

    #[test]
    fn test_wrong_size_rejected() {
        assert!(IntensityLut::from_entries(&[0; 10]).is_err());
        assert!(IntensityLut::from_entries(&[7; 256]).is_ok());
    }

    #[test]
    fn test_window_monotonic() {
        let lut = IntensityLut::window(10, 20);
        let e = lut.entries();
        assert!(e.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(lut.apply(15), 128);
    }
}
