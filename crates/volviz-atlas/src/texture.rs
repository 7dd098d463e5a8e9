//! CPU-side atlas and mask textures.

use std::sync::atomic::{AtomicU64, Ordering};

use volviz_core::TileLayout;

static GENERATION: AtomicU64 = AtomicU64::new(1);

/// Process-wide increasing content generation; 0 means never written.
pub(crate) fn next_generation() -> u64 {
    GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// RGBA8 tile atlas; slice `s` occupies the tile given by
/// [`TileLayout::tile_origin`].
#[derive(Clone)]
pub struct AtlasTexture {
    pub(crate) data: Vec<u8>,
    layout: TileLayout,
    pub(crate) generation: u64,
}

impl AtlasTexture {
    /// Zero-filled atlas for a layout.
    pub fn new(layout: TileLayout) -> Self {
        Self { data: vec![0; layout.atlas_pixels() * 4], layout, generation: 0 }
    }

    /// Tiling of this atlas.
    pub fn layout(&self) -> TileLayout {
        self.layout
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.layout.atlas_width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.layout.atlas_height()
    }

    /// Interleaved RGBA bytes, row-major from the top row.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// One texel.
    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width() as usize + x as usize) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Bumped every time the contents are rewritten.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

impl std::fmt::Debug for AtlasTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtlasTexture")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("generation", &self.generation)
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

/// R8 mask with the same tiling as the atlas.
#[derive(Clone)]
pub struct MaskTexture {
    pub(crate) data: Vec<u8>,
    layout: TileLayout,
    pub(crate) generation: u64,
}

impl MaskTexture {
    /// All-ones mask for a layout.
    pub fn new(layout: TileLayout) -> Self {
        Self { data: vec![255; layout.atlas_pixels()], layout, generation: 0 }
    }

    /// Tiling of this mask.
    pub fn layout(&self) -> TileLayout {
        self.layout
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.layout.atlas_width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.layout.atlas_height()
    }

    /// Mask bytes, row-major from the top row.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// One texel.
    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width() as usize + x as usize]
    }

    /// Bumped every time the contents are rewritten.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl std::fmt::Debug for MaskTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskTexture")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("generation", &self.generation)
            .finish()
    }
}
