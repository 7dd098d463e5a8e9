//! volviz - multi-channel volume renderer CLI
//!
//! Renders raw or synthetic z-stacks through the same pipeline a viewer
//! uses: channel store, atlas fusion, ray marching and isosurfaces.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "volviz")]
#[command(author, version, about = "Multi-channel volume renderer")]
#[command(long_about = "
Ray-marches multi-channel microscopy volumes and extracts isosurfaces.

Input is either one raw u8 file per channel (x fastest, then y, then z)
or a list of synthetic phantoms, one per channel.

Examples:
  volviz info --phantom ball,shell             # Layout and backends
  volviz render --phantom cells -o out.png     # Render a phantom
  volviz render --raw dna.raw --raw mem.raw --size 256x256x64 -o out.png
  volviz render --phantom ball --mip --ortho -o mip.png
  volviz render --phantom ball,shell --config view.yaml -o out.png
  volviz iso --phantom shell --isovalue 100 --method surface-nets
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Show volume layout, channel statistics and available backends
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Render the fused volume to a PNG
    #[command(visible_alias = "r")]
    Render(RenderArgs),

    /// Extract a channel's isosurface and report mesh statistics
    #[command(visible_alias = "iso")]
    Isosurface(IsosurfaceArgs),
}

/// Where channel data comes from.
#[derive(Args)]
struct InputArgs {
    /// Raw u8 volume, one file per channel
    #[arg(long, conflicts_with = "phantom")]
    raw: Vec<PathBuf>,

    /// Synthetic phantoms, one per channel: ball, shell, gradient, cells, uniform
    #[arg(long, value_delimiter = ',', default_value = "ball")]
    phantom: Vec<String>,

    /// Volume size as WxHxD
    #[arg(short, long, default_value = "64x64x64")]
    size: String,

    /// Physical voxel size as X,Y,Z
    #[arg(long)]
    voxel_size: Option<String>,

    /// Image name (defaults to the first file stem or "phantom")
    #[arg(long)]
    name: Option<String>,
}

/// Arguments for the `info` command.
#[derive(Args)]
struct InfoArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Also print the resolved drawable configuration as YAML
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Arguments for the `render` command.
#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output PNG
    #[arg(short, long)]
    output: PathBuf,

    /// YAML drawable configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend: auto, cpu, wgpu
    #[arg(short, long)]
    backend: Option<String>,

    /// Image width
    #[arg(short = 'W', long, default_value = "512")]
    width: u32,

    /// Image height
    #[arg(short = 'H', long, default_value = "512")]
    height: u32,

    /// Opacity multiplier
    #[arg(long)]
    density: Option<f32>,

    /// Intensity multiplier
    #[arg(long)]
    brightness: Option<f32>,

    /// Ray-march steps
    #[arg(long)]
    steps: Option<u32>,

    /// Maximum intensity projection
    #[arg(long)]
    mip: bool,

    /// Orthographic rays
    #[arg(long)]
    ortho: bool,

    /// Channel combine rule: max, average
    #[arg(long)]
    combine: Option<String>,

    /// Channel used as mask
    #[arg(long)]
    mask: Option<usize>,

    /// Channel color as CH=RRGGBB, repeatable
    #[arg(long = "color")]
    colors: Vec<String>,

    /// Channels excluded from the volume
    #[arg(long, value_delimiter = ',')]
    disable: Vec<usize>,

    /// Axis clip as AXIS:MIN:MAX in [-0.5, 0.5], repeatable
    #[arg(long = "clip")]
    clips: Vec<String>,

    /// Camera azimuth in degrees
    #[arg(long, default_value = "30")]
    azimuth: f32,

    /// Camera elevation in degrees
    #[arg(long, default_value = "20")]
    elevation: f32,

    /// Camera distance from the volume center
    #[arg(long, default_value = "2.2")]
    distance: f32,
}

/// Arguments for the `isosurface` command.
#[derive(Args)]
struct IsosurfaceArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Source channel
    #[arg(short = 'C', long, default_value = "0")]
    channel: usize,

    /// Intensity threshold
    #[arg(short, long, default_value = "128")]
    isovalue: f32,

    /// Algorithm: marching-cubes, surface-nets
    #[arg(short, long)]
    method: Option<String>,

    /// Surface opacity
    #[arg(long)]
    opacity: Option<f32>,

    /// YAML drawable configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Render(args) => commands::render::run(args, cli.verbose),
        Commands::Isosurface(args) => commands::isosurface::run(args, cli.verbose),
    }
}
