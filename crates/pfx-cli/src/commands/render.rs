//! Render command
//!
//! Renders one effect over a synthetic source with the chosen selection.
//! Settings come from defaults, then the config file, then flags. The
//! destination starts as a copy of the source, so pixels outside the
//! selection keep their source values.

use crate::{RenderArgs, Selection, SourceKind};
use anyhow::{bail, Context, Result};
use pfx_core::{slice_region, ColorBgra, Rect, Region, Surface};
use pfx_render::{
    DynEffect, ParamValues, ProgressCounter, RenderConfig, RenderRequest, RenderSettings, RenderState,
};
use sha2::{Digest, Sha256};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

/// Runs the render command.
pub fn run(args: RenderArgs, config: &RenderConfig, threads: usize, verbose: bool) -> Result<()> {
    trace!(effect = %args.effect, width = args.width, height = args.height, "render::run");

    let registry = super::registry(config);
    let effect = registry.get_required(&args.effect)?;
    let info = effect.effect_info();

    let defs = effect.param_defs();
    let mut params = config.param_values(info.name, &defs)?;
    for assignment in &args.params {
        params
            .push_assignment(assignment, &defs)
            .with_context(|| format!("Invalid parameter: {assignment}"))?;
    }

    let settings = resolve_settings(&args, config, threads).for_effect(&info);
    let src = synthetic_source(args.source, args.width, args.height)
        .with_context(|| format!("Failed to create {}x{} source", args.width, args.height))?;
    let region = selection(args.selection, src.bounds());
    if region.is_empty() {
        bail!("selection {:?} is empty on a {}x{} surface", args.selection, args.width, args.height);
    }

    info!(effect = info.name, workers = settings.worker_count, tiles = settings.tile_count(), "Rendering");
    if verbose {
        println!(
            "Rendering {} over {} ({:?} selection, {})",
            info.display_name,
            src.bounds(),
            args.selection,
            super::format_pixels(region.area())
        );
    }

    let summary = if args.serial {
        render_serial(&*effect, &params, &src, region, settings)?
    } else {
        render_tiled(effect, &params, src, region, settings, args.timeout_ms)?
    };

    println!("effect:   {}", info.name);
    println!("outcome:  {}", summary.outcome);
    println!("tiles:    {}/{}", summary.tiles_done, summary.tiles);
    println!("workers:  {}", summary.workers);
    println!("pixels:   {}", super::format_pixels(summary.pixels));
    println!("elapsed:  {:.2?}", summary.elapsed);
    println!("checksum: {}", checksum(&summary.output));

    Ok(())
}

/// What the run did, independent of serial or tiled mode.
struct Summary {
    outcome: RenderState,
    tiles: usize,
    tiles_done: usize,
    workers: usize,
    pixels: u64,
    elapsed: Duration,
    output: Surface,
}

fn resolve_settings(args: &RenderArgs, config: &RenderConfig, threads: usize) -> RenderSettings {
    let mut settings = config.apply(RenderSettings::default());
    if threads > 0 {
        settings.worker_count = threads;
    }
    if let Some(tiles) = args.tiles_per_worker {
        settings.tiles_per_worker = tiles;
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    settings
}

fn render_tiled(
    effect: Arc<dyn DynEffect>,
    params: &ParamValues,
    src: Surface,
    region: Region,
    settings: RenderSettings,
    timeout_ms: Option<u64>,
) -> Result<Summary> {
    let dst = Arc::new(RwLock::new(src.clone()));
    let progress = Arc::new(ProgressCounter::new());

    let mut request = RenderRequest::new(Arc::new(src), dst.clone(), region);
    request.settings = settings;
    request.listeners.push(progress.clone());
    request.timeout = timeout_ms.map(Duration::from_millis);

    let report = effect.render(params, request)?;
    debug!(?report, "render report");

    let output = dst
        .read()
        .map_err(|_| anyhow::anyhow!("destination lock poisoned"))?
        .clone();

    Ok(Summary {
        outcome: report.outcome,
        tiles: report.tiles,
        tiles_done: progress.tiles_rendered(),
        workers: report.workers,
        pixels: progress.pixels_rendered(),
        elapsed: report.elapsed,
        output,
    })
}

fn render_serial(
    effect: &dyn DynEffect,
    params: &ParamValues,
    src: &Surface,
    region: Region,
    settings: RenderSettings,
) -> Result<Summary> {
    let tiles = slice_region(&region, settings.tile_count(), src.bounds())?;
    let mut dst = src.clone();

    let started = Instant::now();
    effect.render_serial(params, src, &mut dst, &tiles, settings.seed)?;
    let elapsed = started.elapsed();

    Ok(Summary {
        outcome: RenderState::Completed,
        tiles: tiles.len(),
        tiles_done: tiles.len(),
        workers: 1,
        pixels: region.area(),
        elapsed,
        output: dst,
    })
}

/// Builds the source image.
fn synthetic_source(kind: SourceKind, width: i32, height: i32) -> pfx_core::Result<Surface> {
    match kind {
        SourceKind::Gradient => {
            let (w, h) = (width.max(1) as i64, height.max(1) as i64);
            Surface::from_fn(width, height, |x, y| {
                let (x, y) = (x as i64, y as i64);
                ColorBgra::opaque(
                    (x * 255 / w) as u8,
                    (y * 255 / h) as u8,
                    ((x + y) * 255 / (w + h)) as u8,
                )
            })
        }
        SourceKind::Checker => Surface::from_fn(width, height, |x, y| {
            if (x / 16 + y / 16) % 2 == 0 {
                ColorBgra::WHITE
            } else {
                ColorBgra::opaque(32, 64, 160)
            }
        }),
        SourceKind::Gray => Surface::filled(width, height, ColorBgra::opaque(128, 128, 128)),
    }
}

/// Selection region for `bounds`.
fn selection(shape: Selection, bounds: Rect) -> Region {
    match shape {
        Selection::Full => Region::from_rect(bounds),
        Selection::Rect => Region::from_rect(Rect::new(
            bounds.x + bounds.width / 4,
            bounds.y + bounds.height / 4,
            bounds.width / 2,
            bounds.height / 2,
        )),
        Selection::Ellipse => Region::ellipse(bounds),
    }
}

/// SHA-256 of the surface's BGRA bytes, hex encoded.
fn checksum(surface: &Surface) -> String {
    let mut hasher = Sha256::new();
    hasher.update(surface.as_bytes());
    format!("{:x}", hasher.finalize())
}
