//! CLI command implementations

pub mod info;
pub mod isosurface;
pub mod render;

use anyhow::{Context, Result, bail};
use std::path::Path;
use volviz_core::{Axis, Phantom, Rgb8, TileLayout, VolumeInfo};
use volviz_drawable::{DrawableConfig, VolumeDrawable};

use crate::InputArgs;

/// Channel data ready for a drawable.
pub struct LoadedVolume {
    /// Image metadata.
    pub info: VolumeInfo,
    /// One buffer per channel.
    pub channels: Vec<Vec<u8>>,
    /// Physical voxel size, if given.
    pub voxel_size: Option<Vec<f32>>,
}

impl LoadedVolume {
    /// Builds a drawable and feeds it every channel.
    pub fn into_drawable(self, config: DrawableConfig) -> Result<VolumeDrawable> {
        let mut drawable = VolumeDrawable::new(self.info, config).context("Failed to create drawable")?;
        if let Some(v) = &self.voxel_size {
            drawable.set_voxel_size(v);
        }
        for (i, data) in self.channels.iter().enumerate() {
            drawable
                .set_channel_data_from_volume(i, data)
                .with_context(|| format!("Failed to load channel {i}"))?;
        }
        Ok(drawable)
    }
}

/// Reads raw files or generates phantoms.
pub fn load_volume(args: &InputArgs) -> Result<LoadedVolume> {
    let [w, h, d] = parse_size(&args.size)?;
    let layout = TileLayout::packed(w, h, d).context("Invalid volume size")?;
    let voxel_size = args.voxel_size.as_deref().map(parse_floats).transpose()?;

    let (names, channels) = if args.raw.is_empty() {
        let phantoms = args
            .phantom
            .iter()
            .map(|s| s.parse::<Phantom>())
            .collect::<Result<Vec<_>, _>>()?;
        let names: Vec<String> = phantoms.iter().map(|p| p.to_string()).collect();
        let data = phantoms.iter().map(|p| p.generate(w, h, d)).collect();
        (names, data)
    } else {
        let mut names = Vec::new();
        let mut data = Vec::new();
        for path in &args.raw {
            data.push(load_raw(path, layout.voxel_count())?);
            names.push(file_stem(path));
        }
        (names, data)
    };

    let name = match &args.name {
        Some(n) => n.clone(),
        None => args.raw.first().map(|p| file_stem(p)).unwrap_or_else(|| "phantom".into()),
    };
    Ok(LoadedVolume { info: VolumeInfo::new(name, layout, names), channels, voxel_size })
}

/// Reads a raw u8 volume of exactly `expected` bytes.
pub fn load_raw(path: &Path, expected: usize) -> Result<Vec<u8>> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))?;
    if data.len() != expected {
        bail!("{}: expected {} bytes, found {}", path.display(), expected, data.len());
    }
    Ok(data)
}

/// Loads a YAML config or falls back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<DrawableConfig> {
    match path {
        Some(p) => DrawableConfig::from_file(p).with_context(|| format!("Failed to load config: {}", p.display())),
        None => Ok(DrawableConfig::default()),
    }
}

/// Parses `WxHxD`.
pub fn parse_size(s: &str) -> Result<[u32; 3]> {
    let parts: Vec<&str> = s.split(['x', 'X']).collect();
    if parts.len() != 3 {
        bail!("Invalid size '{s}', expected WxHxD");
    }
    let mut out = [0u32; 3];
    for (slot, p) in out.iter_mut().zip(&parts) {
        *slot = p.trim().parse().with_context(|| format!("Invalid size component '{p}'"))?;
    }
    Ok(out)
}

/// Parses comma separated floats.
pub fn parse_floats(s: &str) -> Result<Vec<f32>> {
    s.split(',')
        .map(|p| p.trim().parse::<f32>().with_context(|| format!("Invalid number '{p}'")))
        .collect()
}

/// Parses `CH=RRGGBB` (a leading `#` is allowed).
pub fn parse_channel_color(s: &str) -> Result<(usize, Rgb8)> {
    let (ch, hex) = s.split_once('=').with_context(|| format!("Invalid color '{s}', expected CH=RRGGBB"))?;
    let ch = ch.trim().parse().with_context(|| format!("Invalid channel '{ch}'"))?;
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 {
        bail!("Invalid color '{hex}', expected RRGGBB");
    }
    let v = u32::from_str_radix(hex, 16).with_context(|| format!("Invalid color '{hex}'"))?;
    Ok((ch, Rgb8::new((v >> 16) as u8, (v >> 8) as u8, v as u8)))
}

/// Parses `AXIS:MIN:MAX`.
pub fn parse_clip(s: &str) -> Result<(Axis, f32, f32)> {
    let parts: Vec<&str> = s.split(':').collect();
    let [axis, min, max] = parts.as_slice() else {
        bail!("Invalid clip '{s}', expected AXIS:MIN:MAX");
    };
    let axis = match axis.to_ascii_lowercase().as_str() {
        "x" => Axis::X,
        "y" => Axis::Y,
        "z" => Axis::Z,
        other => bail!("Invalid axis '{other}'"),
    };
    let min = min.parse().with_context(|| format!("Invalid clip min '{min}'"))?;
    let max = max.parse().with_context(|| format!("Invalid clip max '{max}'"))?;
    Ok((axis, min, max))
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "volume".into())
}
