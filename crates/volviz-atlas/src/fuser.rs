//! Per-pixel channel fusion.
//!
//! Every atlas pixel maps to one voxel. For each pixel the enabled color
//! channels are combined:
//!
//! | Mode      | RGB                                   | Alpha                     |
//! |-----------|---------------------------------------|---------------------------|
//! | `Max`     | per-component max of `lut(v) * color` | max of `lut(v)`           |
//! | `Average` | mean of `lut(v) * color`              | mean of `lut(v)`          |
//!
//! The designated mask channel never contributes color; its LUT-mapped
//! intensity is written to the mask texture instead.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

use volviz_core::{ChannelColor, IntensityLut, TileLayout, VolumeError, VolumeStore};

use crate::texture::{AtlasTexture, MaskTexture, next_generation};
use crate::{FuseError, FuseResult};

/// Per-pixel combine rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    /// Per-component maximum.
    #[default]
    Max,
    /// Mean over enabled color channels.
    Average,
}

/// How one channel takes part in fusion.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionEntry {
    /// Channel index in the store.
    pub channel: usize,
    /// Color, or disabled.
    pub color: ChannelColor,
    /// Intensity remap; identity when absent.
    pub lut: Option<IntensityLut>,
}

impl FusionEntry {
    /// Entry without a LUT.
    pub fn new(channel: usize, color: ChannelColor) -> Self {
        Self { channel, color, lut: None }
    }

    /// Attaches a LUT.
    pub fn with_lut(mut self, lut: IntensityLut) -> Self {
        self.lut = Some(lut);
        self
    }
}

/// Output of a fusion pass.
#[derive(Debug, Clone)]
pub struct FusedTextures {
    /// Fused color atlas.
    pub atlas: AtlasTexture,
    /// Mask texture.
    pub mask: MaskTexture,
}

/// Resolved per-channel inputs for the pixel loop.
struct Source<'a> {
    data: Option<&'a [u8]>,
    lut: [u8; 256],
    color: [f32; 3],
}

impl Source<'_> {
    #[inline]
    fn intensity(&self, voxel: usize) -> u8 {
        let raw = self.data.and_then(|d| d.get(voxel).copied()).unwrap_or(0);
        self.lut[raw as usize]
    }
}

fn lut_table(lut: Option<&IntensityLut>) -> [u8; 256] {
    let mut table = [0u8; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = lut.map_or(i as u8, |l| l.apply(i as u8));
    }
    table
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Owns the fused textures and rewrites them in place on each pass.
#[derive(Debug, Default)]
pub struct AtlasFuser {
    textures: Option<FusedTextures>,
    channel_count: usize,
    allocations: u64,
}

impl AtlasFuser {
    /// Creates a fuser with no textures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current textures, if any pass has run.
    pub fn textures(&self) -> Option<&FusedTextures> {
        self.textures.as_ref()
    }

    /// Number of times textures were (re)allocated.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Releases the textures.
    pub fn cleanup(&mut self) {
        if self.textures.take().is_some() {
            debug!("fused textures released");
        }
    }

    /// Fuses the store's channels into the atlas and mask.
    ///
    /// Entries reference channels by index; disabled entries and channels
    /// without data contribute zero. `mask_channel` selects the channel
    /// written to the mask texture.
    pub fn fuse(
        &mut self,
        entries: &[FusionEntry],
        store: &VolumeStore,
        mode: CombineMode,
        mask_channel: Option<usize>,
    ) -> FuseResult<&FusedTextures> {
        trace!(entries = entries.len(), ?mode, ?mask_channel, "AtlasFuser::fuse");
        let layout = store.tile_layout().map_err(|_| FuseError::NotInitialized)?;

        let count = store.channel_count();
        for e in entries {
            if e.channel >= count {
                return Err(VolumeError::InvalidChannel { index: e.channel, count }.into());
            }
        }
        if let Some(m) = mask_channel {
            store.channel(m)?;
        }

        let color_sources: Vec<Source> = entries
            .iter()
            .filter(|e| Some(e.channel) != mask_channel)
            .filter_map(|e| {
                let rgb = e.color.rgb()?;
                let ch = store.channel(e.channel).ok()?;
                Some(Source {
                    data: ch.is_loaded().then(|| ch.data()),
                    lut: lut_table(e.lut.as_ref()),
                    color: rgb.to_f32(),
                })
            })
            .collect();

        let mask_source = match mask_channel {
            Some(m) => {
                let ch = store.channel(m)?;
                let lut = entries.iter().find(|e| e.channel == m).and_then(|e| e.lut.as_ref());
                Some(Source {
                    data: ch.is_loaded().then(|| ch.data()),
                    lut: lut_table(lut),
                    color: [1.0; 3],
                })
            }
            None => None,
        };

        let textures = self.ensure_textures(layout, count);
        fuse_pixels(&layout, &color_sources, mask_source.as_ref(), mode, textures);
        let generation = next_generation();
        textures.atlas.generation = generation;
        textures.mask.generation = generation;

        debug!(
            sources = color_sources.len(),
            generation = textures.atlas.generation,
            "atlas fused"
        );
        Ok(textures)
    }

    fn ensure_textures(&mut self, layout: TileLayout, channel_count: usize) -> &mut FusedTextures {
        let stale = match &self.textures {
            Some(t) => t.atlas.layout() != layout || self.channel_count != channel_count,
            None => true,
        };
        if stale {
            self.textures = None;
            self.channel_count = channel_count;
        }
        let allocations = &mut self.allocations;
        self.textures.get_or_insert_with(|| {
            info!(
                width = layout.atlas_width(),
                height = layout.atlas_height(),
                channels = channel_count,
                "allocating atlas textures"
            );
            *allocations += 1;
            FusedTextures { atlas: AtlasTexture::new(layout), mask: MaskTexture::new(layout) }
        })
    }
}

fn fuse_pixels(
    layout: &TileLayout,
    sources: &[Source],
    mask: Option<&Source>,
    mode: CombineMode,
    out: &mut FusedTextures,
) {
    let width = layout.atlas_width() as usize;
    let inv_n = if sources.is_empty() { 0.0 } else { 1.0 / sources.len() as f32 };

    out.atlas
        .data
        .par_chunks_mut(width * 4)
        .zip(out.mask.data.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, (row, mask_row))| {
            for x in 0..width {
                let px = &mut row[x * 4..x * 4 + 4];
                let Some(voxel) = layout.voxel_index_at(x as u32, y as u32) else {
                    px.fill(0);
                    mask_row[x] = if mask.is_some() { 0 } else { 255 };
                    continue;
                };

                let mut rgb = [0.0f32; 3];
                let mut alpha = 0.0f32;
                for src in sources {
                    let v = src.intensity(voxel) as f32 / 255.0;
                    match mode {
                        CombineMode::Max => {
                            for c in 0..3 {
                                rgb[c] = rgb[c].max(v * src.color[c]);
                            }
                            alpha = alpha.max(v);
                        }
                        CombineMode::Average => {
                            for c in 0..3 {
                                rgb[c] += v * src.color[c];
                            }
                            alpha += v;
                        }
                    }
                }
                if mode == CombineMode::Average {
                    rgb = rgb.map(|c| c * inv_n);
                    alpha *= inv_n;
                }

                px[0] = to_u8(rgb[0]);
                px[1] = to_u8(rgb[1]);
                px[2] = to_u8(rgb[2]);
                px[3] = to_u8(alpha);
                mask_row[x] = mask.map_or(255, |m| m.intensity(voxel));
            }
        });
}
