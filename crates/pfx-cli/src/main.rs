//! pfx - render built-in effects from the command line
//!
//! Lists and describes the registered effects and renders one over a
//! synthetic surface, reporting timing, progress and a checksum of the
//! result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pfx_render::{Category, RenderConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pfx")]
#[command(author, version, about = "Tiled parallel effect renderer")]
#[command(long_about = "
Renders image effects in parallel tiles over a synthetic surface.

Examples:
  pfx list                                   # All effects by category
  pfx list --category blurs
  pfx describe gaussian-blur                 # Parameters and ranges
  pfx render gaussian-blur -p radius=8       # 512x512, whole surface
  pfx render clouds --selection ellipse -p scale=120 -p blend=multiply
  pfx -j 1 render add-noise --seed 7         # One worker, fixed seed
  pfx render mandelbrot --serial             # Calling thread only
  pfx --config render.yaml render twist --timeout-ms 200
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of worker threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// YAML render configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered effects by category
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Show an effect's parameters
    #[command(visible_alias = "d")]
    Describe(DescribeArgs),

    /// Render an effect over a synthetic surface
    #[command(visible_alias = "r")]
    Render(RenderArgs),
}

#[derive(Args)]
struct ListArgs {
    /// Only this category (blurs, render, noise, distort, adjustments)
    #[arg(long, value_parser = parse_category)]
    category: Option<Category>,
}

#[derive(Args)]
struct DescribeArgs {
    /// Effect name
    effect: String,
}

#[derive(Args)]
struct RenderArgs {
    /// Effect name
    effect: String,

    /// Surface width
    #[arg(short = 'W', long, default_value = "512")]
    width: i32,

    /// Surface height
    #[arg(short = 'H', long, default_value = "512")]
    height: i32,

    /// Selection to render
    #[arg(short, long, value_enum, default_value = "full")]
    selection: Selection,

    /// Synthetic source image
    #[arg(long, value_enum, default_value = "gradient")]
    source: SourceKind,

    /// Tiles per worker
    #[arg(short, long)]
    tiles_per_worker: Option<usize>,

    /// Run seed for random effects
    #[arg(long)]
    seed: Option<u64>,

    /// Parameter assignment name=value (repeatable)
    #[arg(short, long = "param")]
    params: Vec<String>,

    /// Render all tiles in order on the calling thread
    #[arg(long)]
    serial: bool,

    /// Abort the render after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

/// Shape of the rendered selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Selection {
    /// Whole surface
    Full,
    /// Centered rectangle of half the surface size
    Rect,
    /// Ellipse inscribed in the surface
    Ellipse,
}

/// Synthetic source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Diagonal color gradient
    Gradient,
    /// 16-pixel checkerboard
    Checker,
    /// Opaque mid gray
    Gray,
}

fn parse_category(s: &str) -> std::result::Result<Category, String> {
    s.parse()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<RenderConfig> {
    match path {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(RenderConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::List(args) => commands::list::run(args, &config, cli.verbose),
        Commands::Describe(args) => commands::describe::run(args, &config),
        Commands::Render(args) => commands::render::run(args, &config, cli.threads, cli.verbose),
    }
}
