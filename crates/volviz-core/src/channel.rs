//! A single intensity channel of a multi-channel volume.

use crate::TileLayout;

/// Raw 8-bit intensity samples of one channel.
///
/// Samples are ordered x-fastest, then y, then z. The buffer stays empty
/// until data arrives; an unloaded channel reads as zero everywhere.
#[derive(Debug, Clone)]
pub struct Channel {
    index: usize,
    name: String,
    data: Vec<u8>,
    loaded: bool,
}

impl Channel {
    /// Creates an unloaded channel.
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self { index, name: name.into(), data: Vec::new(), loaded: false }
    }

    /// Stable channel index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether data has been delivered.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Volume samples; empty while unloaded.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sample at a linear voxel index, zero if unloaded.
    #[inline]
    pub fn sample(&self, voxel: usize) -> u8 {
        if self.loaded { self.data.get(voxel).copied().unwrap_or(0) } else { 0 }
    }

    /// Sample at voxel coordinates.
    #[inline]
    pub fn sample_xyz(&self, layout: &TileLayout, x: u32, y: u32, z: u32) -> u8 {
        let i = x as usize
            + y as usize * layout.tile_width as usize
            + z as usize * layout.slice_pixels();
        self.sample(i)
    }

    /// Minimum and maximum sample, `None` while unloaded or empty.
    pub fn intensity_range(&self) -> Option<(u8, u8)> {
        if !self.loaded {
            return None;
        }
        let min = *self.data.iter().min()?;
        let max = *self.data.iter().max()?;
        Some((min, max))
    }

    pub(crate) fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.loaded = true;
    }

    pub(crate) fn unload(&mut self) {
        self.data = Vec::new();
        self.loaded = false;
    }
}
