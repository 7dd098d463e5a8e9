//! Channel colors and the default channel palette.
//!
//! A channel's contribution to the fused volume is described by an explicit
//! [`ChannelColor`]: either `Enabled` with an RGB triple or `Disabled`.
//! Disabling never touches channel data, so re-enabling restores the
//! previous appearance.

use serde::{Deserialize, Serialize};

use crate::{VolumeError, VolumeResult};

/// 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb8(pub [u8; 3]);

impl Rgb8 {
    /// Black.
    pub const BLACK: Self = Self([0, 0, 0]);

    /// Creates a color from components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Parses the first three components of a slice.
    ///
    /// Rejects slices with fewer than three components.
    pub fn from_slice(values: &[u8]) -> VolumeResult<Self> {
        match values {
            [r, g, b, ..] => Ok(Self([*r, *g, *b])),
            _ => Err(VolumeError::MalformedInput(format!(
                "color needs 3 components, got {}",
                values.len()
            ))),
        }
    }

    /// Whether all components are zero.
    pub fn is_black(&self) -> bool {
        self.0 == [0, 0, 0]
    }

    /// Components normalized to `[0, 1]`.
    pub fn to_f32(self) -> [f32; 3] {
        self.0.map(|c| c as f32 / 255.0)
    }

    /// Packed `0xRRGGBB`.
    pub fn to_hex(self) -> u32 {
        ((self.0[0] as u32) << 16) | ((self.0[1] as u32) << 8) | self.0[2] as u32
    }
}

/// Visibility state of a channel in the fused volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelColor {
    /// Channel contributes with this color.
    Enabled(Rgb8),
    /// Channel is excluded from fusion.
    #[default]
    Disabled,
}

impl ChannelColor {
    /// Initial state for a channel's default color; black starts disabled.
    pub fn from_initial(color: Rgb8) -> Self {
        if color.is_black() { Self::Disabled } else { Self::Enabled(color) }
    }

    /// Whether the channel is enabled.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// Color if enabled.
    pub fn rgb(&self) -> Option<Rgb8> {
        match self {
            Self::Enabled(c) => Some(*c),
            Self::Disabled => None,
        }
    }
}

/// Palette cycled by [`color_for_channel`].
pub const DEFAULT_PALETTE: [Rgb8; 12] = [
    Rgb8::new(255, 0, 255),
    Rgb8::new(255, 255, 255),
    Rgb8::new(0, 255, 255),
    Rgb8::new(255, 255, 0),
    Rgb8::new(255, 0, 0),
    Rgb8::new(0, 255, 0),
    Rgb8::new(0, 0, 255),
    Rgb8::new(255, 128, 0),
    Rgb8::new(128, 0, 255),
    Rgb8::new(0, 255, 128),
    Rgb8::new(255, 0, 128),
    Rgb8::new(128, 255, 0),
];

/// Default color for a channel index.
pub fn color_for_channel(index: usize) -> Rgb8 {
    DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice() {
        assert_eq!(Rgb8::from_slice(&[1, 2, 3, 4]).unwrap(), Rgb8::new(1, 2, 3));
        assert!(Rgb8::from_slice(&[1, 2]).is_err());
    }

    #[test]
    fn test_black_starts_disabled() {
        assert_eq!(ChannelColor::from_initial(Rgb8::BLACK), ChannelColor::Disabled);
        assert!(ChannelColor::from_initial(Rgb8::new(0, 0, 1)).is_enabled());
    }

    #[test]
    fn test_hex() {
        assert_eq!(Rgb8::new(0x12, 0x34, 0x56).to_hex(), 0x123456);
        assert_eq!(color_for_channel(DEFAULT_PALETTE.len()), DEFAULT_PALETTE[0]);
    }
}
