//! Fixed inputs with known outputs.

use crate::support::{render_tiled, shared, translucent_surface};
use pfx_core::{ColorBgra, Rect, Region, Surface};
use pfx_effects::{
    builtin_registry_with_deny_list, BlendMode, CloudsEffect, GaussianBlurEffect, GaussianBlurToken,
};
use pfx_render::{DynEffect, Effect, ParamValues, RenderConfig, RenderRequest, RenderSettings, RenderState};
use std::sync::Arc;

#[test]
fn blur_radius_zero_is_identity() {
    let settings = RenderSettings::default().with_workers(4).with_tiles_per_worker(4);
    for seed in 0..4 {
        let src = translucent_surface(29 + seed as i32, 17, seed);
        let region = Region::from_rect(src.bounds());
        let out = render_tiled(GaussianBlurEffect, &GaussianBlurToken { radius: 0 }, &src, &region, settings).unwrap();
        assert_eq!(out.as_bytes(), src.as_bytes());
    }
}

#[test]
fn black_4x4_stays_black_under_radius_1() {
    let src = Surface::filled(4, 4, ColorBgra::BLACK).unwrap();
    let region = Region::from_rect(src.bounds());
    let settings = RenderSettings::default().with_workers(2).with_tiles_per_worker(2);
    let out = render_tiled(GaussianBlurEffect, &GaussianBlurToken { radius: 1 }, &src, &region, settings).unwrap();
    assert!(out.pixels().iter().all(|p| *p == ColorBgra::BLACK));
}

#[test]
fn pixels_outside_the_selection_are_untouched() {
    let src = translucent_surface(40, 40, 7);
    let region = Region::ellipse(Rect::new(5, 5, 30, 30));
    let settings = RenderSettings::default().with_workers(3);
    let out = render_tiled(GaussianBlurEffect, &GaussianBlurToken { radius: 4 }, &src, &region, settings).unwrap();

    let mut changed = 0;
    for y in 0..40 {
        for x in 0..40 {
            if region.contains(x, y) {
                changed += usize::from(out.pixel(x, y) != src.pixel(x, y));
            } else {
                assert_eq!(out.pixel(x, y), src.pixel(x, y), "({x}, {y})");
            }
        }
    }
    assert!(changed > 0);
}

#[test]
fn config_file_drives_registry_settings_and_params() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("render.yaml");
    std::fs::write(
        &path,
        "\
render:
  workers: 2
  tiles_per_worker: 3
  seed: 17
deny:
  - namespace: pfx
    name: twist
    max_version: 1.0.0
params:
  gaussian-blur:
    radius: 0
",
    )
    .unwrap();

    let config = RenderConfig::load(&path).unwrap();
    let registry = builtin_registry_with_deny_list(config.deny.clone());
    assert!(registry.get("twist").is_none());
    assert_eq!(registry.load_errors().len(), 1);

    let effect = registry.get_required("gaussian-blur").unwrap();
    let params = config.param_values("gaussian-blur", &effect.param_defs()).unwrap();
    assert_eq!(params.len(), 1);

    let src = Arc::new(translucent_surface(20, 20, 9));
    let dst = shared(Surface::new(20, 20).unwrap());
    let mut request = RenderRequest::new(src.clone(), dst.clone(), Region::from_rect(src.bounds()));
    request.settings = config.apply(RenderSettings::default());
    let report = effect.render(&params, request).unwrap();

    assert_eq!(report.workers, 2);
    assert_eq!(report.tiles, 6);
    assert_eq!(report.outcome, RenderState::Completed);
    assert_eq!(*dst.read().unwrap(), *src);
}

#[test]
fn documented_config_resolves_against_builtin_effects() {
    let config = RenderConfig::from_yaml_str(
        "\
render:
  workers: 4
  tiles_per_worker: 8
  seed: 42
deny:
  - namespace: pfx
    name: twist
    max_version: \"1.0.0\"
params:
  gaussian-blur:
    radius: 6
  clouds:
    blend: multiply
    from: \"ff8000\"
",
    )
    .unwrap();
    let registry = builtin_registry_with_deny_list(config.deny.clone());

    let clouds = registry.get_required("clouds").unwrap();
    let params = config.param_values("clouds", &clouds.param_defs()).unwrap();
    assert_eq!(params.color("from").unwrap(), ColorBgra::opaque(255, 128, 0));
    assert_eq!(params.choice("blend").unwrap(), BlendMode::Multiply as usize);
    let token = CloudsEffect.token_from_params(&params).unwrap();
    assert_eq!(token.from, ColorBgra::opaque(255, 128, 0));
    assert_eq!(token.blend, BlendMode::Multiply);

    let blur = registry.get_required("gaussian-blur").unwrap();
    let params = config.param_values("gaussian-blur", &blur.param_defs()).unwrap();
    assert_eq!(params.int("radius").unwrap(), 6);
}

#[test]
fn parameters_by_name_reach_the_kernel() {
    let registry = builtin_registry_with_deny_list(Vec::new());
    let clouds = registry.get_required("clouds").unwrap();
    let defs = clouds.param_defs();

    let mut params = ParamValues::new();
    params.push_assignment("from=FF0000", &defs).unwrap();
    params.push_assignment("to=FF0000", &defs).unwrap();
    params.push_assignment("blend=replace", &defs).unwrap();

    let src = Surface::filled(16, 16, ColorBgra::WHITE).unwrap();
    let mut dst = src.clone();
    clouds
        .render_serial(&params, &src, &mut dst, &[vec![src.bounds()]], 0)
        .unwrap();
    assert!(dst.pixels().iter().all(|p| *p == ColorBgra::opaque(255, 0, 0)));
}
