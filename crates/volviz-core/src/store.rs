//! Per-channel volume storage.
//!
//! [`VolumeStore`] owns the raw intensity buffers of every channel together
//! with the tile layout and the physical voxel size. Data arrives one
//! channel at a time; every ingestion call returns the batch of channel
//! indices that just became ready so the caller can fuse and rebuild
//! isosurfaces.
//!
//! # Usage
//!
//! ```rust
//! use volviz_core::{TileLayout, VolumeInfo, VolumeStore};
//!
//! let layout = TileLayout::new(2, 2, 2, 2, 1).unwrap();
//! let info = VolumeInfo::new("cells", layout, vec!["dna".into()]);
//! let mut store = VolumeStore::new(info).unwrap();
//!
//! let ready = store.set_channel_data_from_volume(0, &[1u8; 8]).unwrap();
//! assert_eq!(ready, vec![0]);
//! assert!(store.channel(0).unwrap().is_loaded());
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, info, trace, warn};

use crate::{Channel, Rgb8, TileLayout, VolumeError, VolumeResult, color_for_channel};

/// Indices of channels whose data just arrived.
pub type ChannelBatch = Vec<usize>;

/// Metadata describing a volume image before any data arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeInfo {
    /// Image name, used for export naming.
    pub name: String,
    /// Atlas packing of the z-stack.
    pub layout: TileLayout,
    /// One name per channel.
    pub channel_names: Vec<String>,
    /// Initial color per channel; palette colors when empty.
    #[serde(default)]
    pub channel_colors: Vec<Rgb8>,
    /// Physical voxel size (x, y, z).
    #[serde(default = "unit_pixel_size")]
    pub pixel_size: [f32; 3],
}

fn unit_pixel_size() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl VolumeInfo {
    /// Creates metadata with palette colors and unit voxels.
    pub fn new(name: impl Into<String>, layout: TileLayout, channel_names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            layout,
            channel_names,
            channel_colors: Vec::new(),
            pixel_size: unit_pixel_size(),
        }
    }

    /// Initial color of a channel.
    pub fn initial_color(&self, index: usize) -> Rgb8 {
        self.channel_colors.get(index).copied().unwrap_or_else(|| color_for_channel(index))
    }
}

/// Owner of all channel buffers.
#[derive(Debug, Clone)]
pub struct VolumeStore {
    name: String,
    layout: Option<TileLayout>,
    channels: Vec<Channel>,
    pixel_size: [f32; 3],
    scale: Vec3,
}

impl VolumeStore {
    /// Creates a store with a known layout; all channels start unloaded.
    pub fn new(info: VolumeInfo) -> VolumeResult<Self> {
        // Re-validate: the layout may come from deserialized config.
        let l = info.layout;
        let layout = TileLayout::new(l.tile_width, l.tile_height, l.depth, l.atlas_cols, l.atlas_rows)?;
        let channels = info
            .channel_names
            .iter()
            .enumerate()
            .map(|(i, name)| Channel::new(i, name.clone()))
            .collect();
        let mut store = Self {
            name: info.name,
            layout: Some(layout),
            channels,
            pixel_size: unit_pixel_size(),
            scale: Vec3::ONE,
        };
        store.set_voxel_size(&info.pixel_size)?;
        Ok(store)
    }

    /// Creates a store whose layout is not known yet.
    pub fn uninitialized(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layout: None,
            channels: Vec::new(),
            pixel_size: unit_pixel_size(),
            scale: Vec3::ONE,
        }
    }

    /// Establishes or replaces the tile layout.
    ///
    /// Changing the layout invalidates every loaded buffer.
    pub fn initialize(&mut self, layout: TileLayout) {
        if self.layout == Some(layout) {
            return;
        }
        info!(?layout, channels = self.channels.len(), "volume layout established");
        self.layout = Some(layout);
        for ch in &mut self.channels {
            ch.unload();
        }
        self.update_scale();
    }

    /// Image name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current tile layout.
    pub fn tile_layout(&self) -> VolumeResult<TileLayout> {
        self.layout.ok_or(VolumeError::NotInitialized)
    }

    /// Whether a layout is known.
    pub fn is_initialized(&self) -> bool {
        self.layout.is_some()
    }

    /// Number of declared channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// All channels in index order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// One channel.
    pub fn channel(&self, index: usize) -> VolumeResult<&Channel> {
        self.channels
            .get(index)
            .ok_or(VolumeError::InvalidChannel { index, count: self.channels.len() })
    }

    /// Whether every channel has data.
    pub fn all_loaded(&self) -> bool {
        self.channels.iter().all(Channel::is_loaded)
    }

    /// Declares a new, unloaded channel and returns its index.
    pub fn append_empty_channel(&mut self, name: impl Into<String>) -> usize {
        let index = self.channels.len();
        self.channels.push(Channel::new(index, name));
        debug!(index, "appended empty channel");
        index
    }

    /// Assigns data ordered x-fastest, then y, then z.
    pub fn set_channel_data_from_volume(&mut self, index: usize, data: &[u8]) -> VolumeResult<ChannelBatch> {
        trace!(index, len = data.len(), "set_channel_data_from_volume");
        let layout = self.tile_layout()?;
        self.channel(index)?;
        let expected = layout.voxel_count();
        if data.len() != expected {
            return Err(VolumeError::BufferSizeMismatch { expected, actual: data.len() });
        }
        self.channels[index].set_data(data.to_vec());
        Ok(vec![index])
    }

    /// Assigns data from a tile atlas of `atlas_width x atlas_height` pixels.
    pub fn set_channel_data_from_atlas(
        &mut self,
        index: usize,
        atlas: &[u8],
        atlas_width: u32,
        atlas_height: u32,
    ) -> VolumeResult<ChannelBatch> {
        trace!(index, atlas_width, atlas_height, "set_channel_data_from_atlas");
        let layout = self.tile_layout()?;
        self.channel(index)?;
        if atlas_width < layout.atlas_width() || atlas_height < layout.atlas_height() {
            return Err(VolumeError::MalformedInput(format!(
                "atlas {atlas_width}x{atlas_height} smaller than layout {}x{}",
                layout.atlas_width(),
                layout.atlas_height()
            )));
        }
        let expected = atlas_width as usize * atlas_height as usize;
        if atlas.len() != expected {
            return Err(VolumeError::BufferSizeMismatch { expected, actual: atlas.len() });
        }

        let tw = layout.tile_width as usize;
        let th = layout.tile_height as usize;
        let mut volume = vec![0u8; layout.voxel_count()];
        for (z, slice) in volume.chunks_exact_mut(layout.slice_pixels()).enumerate() {
            let (ox, oy) = layout.tile_origin(z as u32);
            for (y, row) in slice.chunks_exact_mut(tw).enumerate().take(th) {
                let start = (oy as usize + y) * atlas_width as usize + ox as usize;
                row.copy_from_slice(&atlas[start..start + tw]);
            }
        }
        self.channels[index].set_data(volume);
        Ok(vec![index])
    }

    /// Physical voxel size.
    pub fn pixel_size(&self) -> [f32; 3] {
        self.pixel_size
    }

    /// Relative physical extent of the volume box, largest axis near 1.
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Sets the physical voxel size.
    ///
    /// Needs at least three components; non-positive components keep their
    /// previous value.
    pub fn set_voxel_size(&mut self, values: &[f32]) -> VolumeResult<Vec3> {
        if values.len() < 3 {
            return Err(VolumeError::MalformedInput(format!(
                "voxel size needs 3 components, got {}",
                values.len()
            )));
        }
        for (slot, &v) in self.pixel_size.iter_mut().zip(values) {
            if v > 0.0 {
                *slot = v;
            } else {
                warn!(value = v, "ignoring non-positive voxel size");
            }
        }
        self.update_scale();
        Ok(self.scale)
    }

    fn update_scale(&mut self) {
        let Some(layout) = self.layout else {
            return;
        };
        let phys_min = self.pixel_size.iter().copied().fold(f32::INFINITY, f32::min);
        let pixels_max = layout.max_dim() as f32;
        let dims = [layout.tile_width, layout.tile_height, layout.depth];
        let s: [f32; 3] =
            std::array::from_fn(|i| self.pixel_size[i] / phys_min * dims[i] as f32 / pixels_max);
        self.scale = Vec3::from(s);
        debug!(scale = ?self.scale, "volume scale updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn store() -> VolumeStore {
        let layout = TileLayout::new(4, 2, 3, 2, 2).unwrap();
        VolumeStore::new(VolumeInfo::new("t", layout, vec!["a".into(), "b".into()])).unwrap()
    }

    #[test]
    fn test_uninitialized() {
        let mut s = VolumeStore::uninitialized("x");
        assert_eq!(s.tile_layout(), Err(VolumeError::NotInitialized));
        assert!(s.set_channel_data_from_volume(0, &[]).unwrap_err().is_not_initialized());
    }

    #[test]
    fn test_size_checked() {
        let mut s = store();
        let err = s.set_channel_data_from_volume(0, &[0; 5]).unwrap_err();
        assert_eq!(err, VolumeError::BufferSizeMismatch { expected: 24, actual: 5 });
        assert!(!s.channel(0).unwrap().is_loaded());
        assert!(matches!(
            s.set_channel_data_from_volume(9, &[0; 24]),
            Err(VolumeError::InvalidChannel { index: 9, count: 2 })
        ));
    }

    #[test]
    fn test_atlas_unpack() {
        let mut s = store();
        let layout = s.tile_layout().unwrap();
        let (aw, ah) = (layout.atlas_width(), layout.atlas_height());
        // atlas pixel value = slice id + 1, unused tile = 99
        let atlas: Vec<u8> = (0..ah)
            .flat_map(|y| (0..aw).map(move |x| (x, y)))
            .map(|(x, y)| layout.slice_at(x, y).map_or(99, |z| z as u8 + 1))
            .collect();
        s.set_channel_data_from_atlas(1, &atlas, aw, ah).unwrap();
        let ch = s.channel(1).unwrap();
        assert_eq!(ch.sample_xyz(&layout, 3, 1, 0), 1);
        assert_eq!(ch.sample_xyz(&layout, 0, 0, 2), 3);
        assert!(ch.data().iter().all(|&v| v != 99));
    }

    #[test]
    fn test_voxel_size() {
        let mut s = store();
        assert!(s.set_voxel_size(&[1.0, 2.0]).is_err());
        let scale = s.set_voxel_size(&[1.0, 1.0, 2.0]).unwrap();
        // dims 4x2x3, max 4
        assert_relative_eq!(scale.x, 1.0);
        assert_relative_eq!(scale.y, 0.5);
        assert_relative_eq!(scale.z, 1.5);
        // zero is ignored
        s.set_voxel_size(&[0.0, 1.0, 2.0]).unwrap();
        assert_eq!(s.pixel_size(), [1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_append_channel() {
        let mut s = store();
        assert_eq!(s.append_empty_channel("c"), 2);
        assert_eq!(s.channel_count(), 3);
        assert!(!s.all_loaded());
    }
}
