//! Rendered output.

use crate::{MarchError, MarchResult};

/// RGBA f32 image produced by one render call; row 0 is the top.
#[derive(Clone)]
pub struct RenderedFrame {
    pub(crate) data: Vec<f32>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl RenderedFrame {
    /// Wraps interleaved RGBA data.
    pub fn from_rgba(data: Vec<f32>, width: u32, height: u32) -> MarchResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(MarchError::OperationFailed(format!(
                "frame buffer has {} floats, expected {expected}",
                data.len()
            )));
        }
        Ok(Self { data, width, height })
    }

    /// Interleaved RGBA floats.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// One pixel.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Quantized to 8 bits per channel.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.data.iter().map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8).collect()
    }

    /// Number of pixels with non-zero alpha.
    pub fn covered_pixels(&self) -> usize {
        self.data.chunks_exact(4).filter(|p| p[3] > 0.0).count()
    }
}

impl std::fmt::Debug for RenderedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("covered", &self.covered_pixels())
            .finish()
    }
}
