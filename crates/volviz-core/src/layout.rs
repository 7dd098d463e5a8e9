//! Tile layout of a z-stack packed into a 2D atlas.
//!
//! A volume of `tile_width x tile_height x depth` voxels is stored as a grid
//! of `atlas_cols x atlas_rows` tiles. Slice `s` occupies the tile at
//! column `s % atlas_cols` and row `s / atlas_cols`:
//!
//! ```text
//!  atlas_cols = 3
//! ┌────┬────┬────┐
//! │ z0 │ z1 │ z2 │
//! ├────┼────┼────┤
//! │ z3 │ z4 │ -- │   <- unused tiles stay zero
//! └────┴────┴────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use volviz_core::TileLayout;
//!
//! let layout = TileLayout::new(64, 32, 5, 3, 2).unwrap();
//! assert_eq!(layout.atlas_width(), 192);
//! assert_eq!(layout.atlas_height(), 64);
//! assert_eq!(layout.tile_origin(4), (64, 32));
//! ```

use serde::{Deserialize, Serialize};

use crate::{VolumeError, VolumeResult};

/// Packing of a 3D stack into a 2D tile atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileLayout {
    /// Width of one z-slice in pixels.
    pub tile_width: u32,
    /// Height of one z-slice in pixels.
    pub tile_height: u32,
    /// Number of z-slices.
    pub depth: u32,
    /// Tiles per atlas row.
    pub atlas_cols: u32,
    /// Tile rows in the atlas.
    pub atlas_rows: u32,
}

impl TileLayout {
    /// Creates a layout, checking `atlas_cols * atlas_rows >= depth`.
    pub fn new(
        tile_width: u32,
        tile_height: u32,
        depth: u32,
        atlas_cols: u32,
        atlas_rows: u32,
    ) -> VolumeResult<Self> {
        if tile_width == 0 || tile_height == 0 || depth == 0 {
            return Err(VolumeError::InvalidLayout(format!(
                "empty volume {tile_width}x{tile_height}x{depth}"
            )));
        }
        if (atlas_cols as u64) * (atlas_rows as u64) < depth as u64 {
            return Err(VolumeError::InvalidLayout(format!(
                "{atlas_cols}x{atlas_rows} tiles cannot hold {depth} slices"
            )));
        }
        if atlas_cols.checked_mul(tile_width).is_none() || atlas_rows.checked_mul(tile_height).is_none() {
            return Err(VolumeError::InvalidLayout(format!(
                "{atlas_cols}x{atlas_rows} tiles of {tile_width}x{tile_height} overflow the atlas size"
            )));
        }
        Ok(Self { tile_width, tile_height, depth, atlas_cols, atlas_rows })
    }

    /// Picks the most square tile grid that fits `depth` slices.
    pub fn packed(tile_width: u32, tile_height: u32, depth: u32) -> VolumeResult<Self> {
        let depth_f = depth.max(1) as f64;
        // Balance the atlas extent, not the tile count.
        let aspect = tile_height as f64 / tile_width.max(1) as f64;
        let cols = ((depth_f * aspect).sqrt().ceil() as u32).clamp(1, depth.max(1));
        let rows = depth.max(1).div_ceil(cols);
        Self::new(tile_width, tile_height, depth, cols, rows)
    }

    /// Atlas width in pixels.
    pub fn atlas_width(&self) -> u32 {
        self.atlas_cols * self.tile_width
    }

    /// Atlas height in pixels.
    pub fn atlas_height(&self) -> u32 {
        self.atlas_rows * self.tile_height
    }

    /// Number of atlas pixels.
    pub fn atlas_pixels(&self) -> usize {
        self.atlas_width() as usize * self.atlas_height() as usize
    }

    /// Pixels in one z-slice.
    pub fn slice_pixels(&self) -> usize {
        self.tile_width as usize * self.tile_height as usize
    }

    /// Voxels in the whole volume.
    pub fn voxel_count(&self) -> usize {
        self.slice_pixels() * self.depth as usize
    }

    /// Top-left atlas pixel of the tile holding `slice`.
    pub fn tile_origin(&self, slice: u32) -> (u32, u32) {
        let col = slice % self.atlas_cols;
        let row = slice / self.atlas_cols;
        (col * self.tile_width, row * self.tile_height)
    }

    /// Slice stored at atlas pixel `(x, y)`, or `None` for an unused tile.
    pub fn slice_at(&self, x: u32, y: u32) -> Option<u32> {
        let col = x / self.tile_width;
        let row = y / self.tile_height;
        let slice = row * self.atlas_cols + col;
        (col < self.atlas_cols && row < self.atlas_rows && slice < self.depth).then_some(slice)
    }

    /// Volume index `x + y*w + z*w*h` of the voxel shown at atlas pixel `(x, y)`.
    pub fn voxel_index_at(&self, x: u32, y: u32) -> Option<usize> {
        let slice = self.slice_at(x, y)?;
        let lx = (x % self.tile_width) as usize;
        let ly = (y % self.tile_height) as usize;
        Some(lx + ly * self.tile_width as usize + slice as usize * self.slice_pixels())
    }

    /// Largest voxel dimension, used when normalizing physical scale.
    pub fn max_dim(&self) -> u32 {
        self.tile_width.max(self.tile_height).max(self.depth)
    }
}
