//! Volume info command.
//!
//! Prints the tile layout, per-channel intensity ranges, the box scale and
//! the render backends available on this machine.

use crate::InfoArgs;
use anyhow::Result;
use volviz_march::describe_backends;

/// Runs the info command.
pub fn run(args: InfoArgs, verbose: bool) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let volume = super::load_volume(&args.input)?;
    let layout = volume.info.layout;
    let drawable = volume.into_drawable(config.clone())?;

    println!("{}", drawable.name());
    println!(
        "  Size:       {}x{}x{}",
        layout.tile_width, layout.tile_height, layout.depth
    );
    println!(
        "  Atlas:      {}x{} ({}x{} tiles)",
        layout.atlas_width(),
        layout.atlas_height(),
        layout.atlas_cols,
        layout.atlas_rows
    );
    let s = drawable.scale();
    println!("  Scale:      {:.3} {:.3} {:.3}", s.x, s.y, s.z);
    println!("  Channels:   {}", drawable.channel_count());
    for channel in drawable.store().channels() {
        let range = channel
            .intensity_range()
            .map(|(lo, hi)| format!("{lo}..{hi}"))
            .unwrap_or_else(|| "not loaded".into());
        let color = drawable.channel_color(channel.index()).map(|c| format!("#{:06x}", c.to_hex())).unwrap_or_default();
        println!("    [{}] {:<12} {} {}", channel.index(), channel.name(), color, range);
    }

    println!();
    println!("{}", describe_backends());

    if verbose || args.config.is_some() {
        println!();
        print!("{}", config.to_yaml()?);
    }
    Ok(())
}
