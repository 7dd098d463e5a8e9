//! Isosurface command.
//!
//! Extracts one channel's isosurface through the drawable and prints mesh
//! and material statistics.

use crate::IsosurfaceArgs;
use anyhow::{Context, Result, bail};
use std::time::Instant;
use volviz_iso::ExtractionMethod;

/// Runs the isosurface command.
pub fn run(args: IsosurfaceArgs, verbose: bool) -> Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;
    if let Some(m) = &args.method {
        config.extraction = parse_method(m)?;
    }

    let volume = super::load_volume(&args.input)?;
    let mut drawable = volume.into_drawable(config)?;
    if args.channel >= drawable.channel_count() {
        bail!("Channel {} out of range (volume has {})", args.channel, drawable.channel_count());
    }

    let start = Instant::now();
    drawable.create_isosurface(args.channel, args.isovalue, args.opacity, None);
    let elapsed = start.elapsed();
    let snapshot = drawable
        .isosurface_snapshot(args.channel)
        .context("Isosurface was not created")?;

    let mesh = &snapshot.mesh;
    println!("{}", snapshot.name);
    println!("  Method:     {}", drawable.extraction_method().name());
    println!("  Isovalue:   {}", snapshot.isovalue);
    println!("  Vertices:   {}", mesh.vertex_count());
    println!("  Triangles:  {}", mesh.triangle_count());
    match mesh.bounds() {
        Some((min, max)) => {
            println!("  Bounds min: {:.3} {:.3} {:.3}", min.x, min.y, min.z);
            println!("  Bounds max: {:.3} {:.3} {:.3}", max.x, max.y, max.z);
        }
        None => println!("  Bounds:     empty"),
    }
    if verbose {
        let m = snapshot.material;
        println!("  Color:      #{:06x}", m.color.to_hex());
        println!("  Opacity:    {} (transparent: {})", m.opacity, m.transparent);
        println!("  Time:       {:.1} ms", elapsed.as_secs_f64() * 1000.0);
    }
    Ok(())
}

fn parse_method(s: &str) -> Result<ExtractionMethod> {
    match s.to_ascii_lowercase().replace('_', "-").as_str() {
        "marching-cubes" | "mc" => Ok(ExtractionMethod::MarchingCubes),
        "surface-nets" | "sn" => Ok(ExtractionMethod::SurfaceNets),
        _ => bail!("Unknown method '{s}', expected marching-cubes or surface-nets"),
    }
}
