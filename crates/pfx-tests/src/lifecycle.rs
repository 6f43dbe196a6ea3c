//! Abort, fault surfacing and progress reporting on real runs.

use crate::support::{noise_surface, shared};
use pfx_core::{ColorBgra, Rect, Region, Surface};
use pfx_effects::{GaussianBlurEffect, GaussianBlurToken};
use pfx_render::{
    Category, Effect, EffectError, EffectInfo, EffectResult, ParamValues, ProgressCounter, RenderError,
    RenderSettings, RenderState, TileContext, TiledRenderer,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Fills tiles with a color after an optional delay, failing on the tile
/// named by the token.
struct Sluggish {
    delay: Duration,
}

impl Effect for Sluggish {
    type Token = Option<usize>;
    type State = ();

    fn info(&self) -> EffectInfo {
        EffectInfo::new("test", "sluggish", "Sluggish", Category::Render)
    }

    fn token_from_params(&self, _: &ParamValues) -> EffectResult<Option<usize>> {
        Ok(None)
    }

    fn bind(&self, _: &Option<usize>, _: &Surface, _: Rect) -> EffectResult<()> {
        Ok(())
    }

    fn render_tile(&self, _: &(), ctx: &mut TileContext<'_, Option<usize>>) -> EffectResult<()> {
        thread::sleep(self.delay);
        if *ctx.token() == Some(ctx.index()) {
            return Err(EffectError::failed(format!("refusing tile {}", ctx.index())));
        }
        ctx.writer().fill(ColorBgra::WHITE);
        Ok(())
    }
}

fn renderer(delay_ms: u64, workers: usize, tiles_per_worker: usize) -> (TiledRenderer<Sluggish>, Arc<ProgressCounter>) {
    let src = Surface::new(64, 64).unwrap();
    let region = Region::from_rect(src.bounds());
    let settings = RenderSettings::default()
        .with_workers(workers)
        .with_tiles_per_worker(tiles_per_worker);
    let effect = Sluggish {
        delay: Duration::from_millis(delay_ms),
    };
    let mut renderer =
        TiledRenderer::new(Arc::new(effect), Arc::new(src.clone()), shared(src), &region, settings).unwrap();
    let progress = Arc::new(ProgressCounter::new());
    renderer.add_listener(progress.clone());
    (renderer, progress)
}

#[test]
fn abort_right_after_start_stops_early() {
    let (mut renderer, progress) = renderer(20, 2, 32);
    renderer.start(&None).unwrap();
    renderer.abort_async();
    renderer.join().unwrap();

    assert!(renderer.did_abort());
    assert_eq!(renderer.last_outcome(), Some(RenderState::Aborted));
    assert!(progress.tiles_rendered() < 64);
    assert!(!progress.is_finished());
}

#[test]
fn abort_from_another_thread() {
    let (mut renderer, progress) = renderer(10, 1, 64);
    let handle = renderer.abort_handle();
    renderer.start(&None).unwrap();
    let aborter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        handle.abort();
    });
    renderer.join().unwrap();
    aborter.join().unwrap();

    assert_eq!(renderer.last_outcome(), Some(RenderState::Aborted));
    assert!(progress.tiles_rendered() < 64);
}

#[test]
fn first_tile_fault_is_surfaced_and_cleared() {
    let (mut renderer, progress) = renderer(0, 4, 2);
    renderer.start(&Some(0)).unwrap();
    let err = renderer.join().unwrap_err();

    match &err {
        RenderError::Effect { source, tile, .. } => {
            assert_eq!(*tile, Some(0));
            assert_eq!(source.to_string(), "refusing tile 0");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(renderer.pending_faults(), 0);
    assert_eq!(renderer.last_outcome(), Some(RenderState::Faulted));
    assert!(!progress.is_finished());

    // The next run starts clean
    renderer.start(&None).unwrap();
    renderer.join().unwrap();
    assert_eq!(renderer.last_outcome(), Some(RenderState::Completed));
    assert_eq!(renderer.pending_faults(), 0);
}

#[test]
fn later_tile_fault_halts_the_run() {
    let (mut renderer, _) = renderer(0, 1, 16);
    renderer.start(&Some(3)).unwrap();
    let err = renderer.join().unwrap_err();
    assert_eq!(err.fault_count(), 1);

    // One worker renders in order, so nothing after the fault was drawn
    let dst = renderer.destination().read().unwrap();
    let tile_4 = renderer.tiles()[4][0];
    assert_eq!(dst.pixel(tile_4.x, tile_4.y), ColorBgra::TRANSPARENT_BLACK);
    let tile_2 = renderer.tiles()[2][0];
    assert_eq!(dst.pixel(tile_2.x, tile_2.y), ColorBgra::WHITE);
}

#[test]
fn progress_reports_every_tile_with_tile_zero_first() {
    let src = Arc::new(noise_surface(48, 48, 8));
    let dst = shared((*src).clone());
    let region = Region::ellipse(src.bounds());
    let settings = RenderSettings::default().with_workers(3).with_tiles_per_worker(5);
    let mut renderer = TiledRenderer::new(Arc::new(GaussianBlurEffect), src, dst, &region, settings).unwrap();
    let progress = Arc::new(ProgressCounter::new());
    renderer.add_listener(progress.clone());

    for run in 1..=2 {
        renderer.start(&GaussianBlurToken { radius: 3 }).unwrap();
        renderer.join().unwrap();
        assert_eq!(progress.starts(), run);
        assert_eq!(progress.first_tile(), Some(0));
        assert_eq!(progress.tiles_rendered(), 15);
        assert_eq!(progress.total_tiles(), 15);
        assert_eq!(progress.pixels_rendered(), region.area());
        assert!(progress.is_finished());
    }
}
