//! Render command.
//!
//! Loads a volume, applies config and command-line overrides, ray-marches
//! one frame and writes it as an 8-bit RGBA PNG.

use crate::RenderArgs;
use anyhow::{Context, Result, bail};
use glam::Vec3;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;
use tracing::info;
use volviz_atlas::CombineMode;
use volviz_drawable::DrawableConfig;
use volviz_march::{Backend, CameraState, RenderedFrame};

/// Density used when no config file sets one.
const DEFAULT_DENSITY: f32 = 0.05;

/// Runs the render command.
pub fn run(args: RenderArgs, verbose: bool) -> Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;
    if args.config.is_none() {
        // bare defaults render nothing visible
        config.render.density = DEFAULT_DENSITY;
        config.render.brightness = 1.0;
    }
    apply_overrides(&mut config, &args)?;

    let volume = super::load_volume(&args.input)?;
    let mut drawable = volume.into_drawable(config)?;

    for spec in &args.colors {
        let (ch, color) = super::parse_channel_color(spec)?;
        drawable.update_channel_color(ch, color);
    }
    for &ch in &args.disable {
        drawable.set_volume_channel_enabled(ch, false);
    }
    if args.mask.is_some() {
        drawable.set_channel_as_mask(args.mask);
    }
    for spec in &args.clips {
        let (axis, min, max) = super::parse_clip(spec)?;
        drawable.set_axis_clip(axis, min, max, args.ortho && axis == volviz_core::Axis::Z);
    }

    let camera = orbit_camera(args.azimuth, args.elevation, args.distance, args.width, args.height);
    let start = Instant::now();
    let Some(frame) = drawable.render(&camera).context("Render failed")? else {
        bail!("Nothing to render: every channel is disabled");
    };
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "frame rendered");

    write_png(&args.output, &frame)?;
    if verbose {
        println!(
            "{}: {}x{}, {} covered pixels, {} steps",
            args.output.display(),
            frame.width,
            frame.height,
            frame.covered_pixels(),
            drawable.sample_rate()
        );
    }
    Ok(())
}

fn apply_overrides(config: &mut DrawableConfig, args: &RenderArgs) -> Result<()> {
    if let Some(b) = &args.backend {
        config.backend = parse_backend(b)?;
    }
    if let Some(c) = &args.combine {
        config.combine_mode = parse_combine(c)?;
    }
    let render = &mut config.render;
    if let Some(v) = args.density {
        render.density = v;
    }
    if let Some(v) = args.brightness {
        render.brightness = v;
    }
    if let Some(v) = args.steps {
        render.steps = v;
    }
    render.max_projection |= args.mip;
    render.orthographic |= args.ortho;
    Ok(())
}

/// Parses a backend name.
pub fn parse_backend(s: &str) -> Result<Backend> {
    match s.to_ascii_lowercase().as_str() {
        "auto" => Ok(Backend::Auto),
        "cpu" => Ok(Backend::Cpu),
        "wgpu" | "gpu" => Ok(Backend::Wgpu),
        _ => bail!("Unknown backend '{s}', expected auto, cpu or wgpu"),
    }
}

fn parse_combine(s: &str) -> Result<CombineMode> {
    match s.to_ascii_lowercase().as_str() {
        "max" => Ok(CombineMode::Max),
        "average" | "avg" => Ok(CombineMode::Average),
        _ => bail!("Unknown combine mode '{s}', expected max or average"),
    }
}

/// Camera orbiting the volume center, angles in degrees.
fn orbit_camera(azimuth: f32, elevation: f32, distance: f32, width: u32, height: u32) -> CameraState {
    let (az, el) = (azimuth.to_radians(), elevation.to_radians());
    let eye = Vec3::new(el.cos() * az.sin(), el.sin(), el.cos() * az.cos()) * distance;
    CameraState::look_at(eye, Vec3::ZERO, Vec3::Y, 45f32.to_radians(), width, height)
}

fn write_png(path: &Path, frame: &RenderedFrame) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create: {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::default());

    let mut writer = encoder.write_header().context("Failed to write PNG header")?;
    writer
        .write_image_data(&frame.to_rgba8())
        .with_context(|| format!("Failed to save: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!(parse_backend("CPU").unwrap(), Backend::Cpu);
        assert_eq!(parse_backend("gpu").unwrap(), Backend::Wgpu);
        assert!(parse_backend("metal").is_err());
    }

    #[test]
    fn test_orbit_camera_distance() {
        let cam = orbit_camera(45.0, 30.0, 3.0, 8, 8);
        let eye = cam.view.inverse().w_axis.truncate();
        assert!((eye.length() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_write_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.png");
        let frame = RenderedFrame::from_rgba(vec![0.5; 4 * 6], 3, 2).unwrap();
        write_png(&path, &frame).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
