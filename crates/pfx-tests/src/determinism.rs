//! Parallel rendering produces the same pixels as in-order serial
//! rendering of the same tiles.

use crate::support::{noise_surface, shared, translucent_surface};
use pfx_core::{slice_region, ColorBgra, Rect, Region, Surface};
use pfx_effects::{builtin_registry, LevelsEffect, LevelsToken};
use pfx_render::{DynEffect, ParamValues, RenderRequest, RenderSettings, TiledRenderer};
use std::sync::Arc;

fn selection(bounds: Rect) -> Region {
    Region::ellipse(bounds).union(&Region::from_rect(Rect::new(0, 0, bounds.width, 3)))
}

/// Renders every built-in effect with default parameters both ways.
fn compare_all(src: Surface, settings: RenderSettings) {
    let registry = builtin_registry();
    let region = selection(src.bounds());
    let src = Arc::new(src);

    for info in registry.available() {
        let effect = registry.get_required(info.name).unwrap();
        let params = ParamValues::new();
        let effective = settings.for_effect(&info);
        let tiles = slice_region(&region, effective.tile_count(), src.bounds()).unwrap();

        let mut serial = (*src).clone();
        effect
            .render_serial(&params, &src, &mut serial, &tiles, settings.seed)
            .unwrap();

        let dst = shared((*src).clone());
        let mut request = RenderRequest::new(src.clone(), dst.clone(), region.clone());
        request.settings = settings;
        let report = effect.render(&params, request).unwrap();
        assert_eq!(report.tiles, tiles.len(), "{}", info.name);

        let parallel = dst.read().unwrap();
        assert!(*parallel == serial, "{} differs with {} workers", info.name, settings.worker_count);
    }
}

#[test]
fn single_worker_matches_serial() {
    let settings = RenderSettings::default().with_workers(1).with_tiles_per_worker(6).with_seed(11);
    compare_all(noise_surface(40, 30, 1), settings);
}

#[test]
fn many_workers_match_serial() {
    let settings = RenderSettings::default().with_workers(4).with_tiles_per_worker(3).with_seed(99);
    compare_all(translucent_surface(37, 29, 2), settings);
}

#[test]
fn repeated_runs_are_identical() {
    let registry = builtin_registry();
    let effect = registry.get_required("add-noise").unwrap();
    let src = Arc::new(noise_surface(32, 32, 3));
    let region = Region::from_rect(src.bounds());
    let settings = RenderSettings::default().with_workers(3).with_seed(5);

    let run = || {
        let dst = shared((*src).clone());
        let mut request = RenderRequest::new(src.clone(), dst.clone(), region.clone());
        request.settings = settings;
        effect.clone().render(&ParamValues::new(), request).unwrap();
        let out = dst.read().unwrap().clone();
        out
    };
    assert_eq!(run(), run());
}

#[test]
fn worker_tokens_are_isolated() {
    // Every worker derives its own lookup tables; the caller's token is
    // never touched.
    let token = LevelsToken::new().with_output(ColorBgra::WHITE, ColorBgra::BLACK);
    let src = noise_surface(24, 24, 4);
    let dst = shared(src.clone());
    let region = Region::from_rect(src.bounds());
    let settings = RenderSettings::default().with_workers(4).with_tiles_per_worker(4);
    let mut renderer =
        TiledRenderer::new(Arc::new(LevelsEffect), Arc::new(src.clone()), dst.clone(), &region, settings).unwrap();

    for _ in 0..3 {
        renderer.start(&token).unwrap();
        renderer.join().unwrap();
    }
    assert!(!token.has_luts());

    let out = dst.read().unwrap();
    for (s, d) in src.pixels().iter().zip(out.pixels()) {
        assert_eq!((d.b, d.g, d.r, d.a), (255 - s.b, 255 - s.g, 255 - s.r, s.a));
    }
}
