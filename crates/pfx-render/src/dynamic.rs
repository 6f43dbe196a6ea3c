//! Type-erased effects.
//!
//! [`Effect`] has associated types and cannot be a trait object.
//! [`DynEffect`] is its object-safe counterpart, implemented for every
//! effect, so registries and front-ends can hold effects of different
//! token types and render them by name from [`ParamValues`].

use crate::effect::{Effect, EffectInfo};
use crate::error::{EffectResult, RenderResult};
use crate::listener::RenderListener;
use crate::params::{ParamDef, ParamValues};
use crate::renderer::{render_serial, RenderState, TiledRenderer};
use crate::settings::RenderSettings;
use pfx_core::{Rect, Region, SharedSurface, Surface};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One blocking render through [`DynEffect::render`].
#[derive(Clone)]
pub struct RenderRequest {
    /// Source surface
    pub src: Arc<Surface>,
    /// Destination surface, same size as `src`
    pub dst: SharedSurface,
    /// Pixels to render
    pub region: Region,
    /// Scheduling
    pub settings: RenderSettings,
    /// Listeners attached for this run
    pub listeners: Vec<Arc<dyn RenderListener>>,
    /// Abort the run if it is still going after this long
    pub timeout: Option<Duration>,
}

impl RenderRequest {
    /// Request with default settings, no listeners and no timeout.
    pub fn new(src: Arc<Surface>, dst: SharedSurface, region: Region) -> Self {
        Self {
            src,
            dst,
            region,
            settings: RenderSettings::default(),
            listeners: Vec::new(),
            timeout: None,
        }
    }
}

/// Summary of a finished [`DynEffect::render`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    /// Effect name
    pub effect: &'static str,
    /// Number of tiles
    pub tiles: usize,
    /// Worker threads used
    pub workers: usize,
    /// `Completed` or `Aborted`
    pub outcome: RenderState,
    /// Wall-clock time from start to join
    pub elapsed: Duration,
}

/// Object-safe view of an [`Effect`].
///
/// Method names differ from [`Effect`]'s so both traits can be in scope.
pub trait DynEffect: Send + Sync {
    /// See [`Effect::info`].
    fn effect_info(&self) -> EffectInfo;

    /// See [`Effect::parameters`].
    fn param_defs(&self) -> Vec<ParamDef>;

    /// Checks that `params` yield a valid token.
    fn check_params(&self, params: &ParamValues) -> EffectResult<()>;

    /// Renders on a [`TiledRenderer`] and waits for the result.
    fn render(self: Arc<Self>, params: &ParamValues, request: RenderRequest) -> RenderResult<RenderReport>;

    /// Renders `tiles` in order on the calling thread. See [`render_serial`].
    fn render_serial(
        &self,
        params: &ParamValues,
        src: &Surface,
        dst: &mut Surface,
        tiles: &[Vec<Rect>],
        seed: u64,
    ) -> RenderResult<()>;
}

impl<E: Effect> DynEffect for E {
    fn effect_info(&self) -> EffectInfo {
        Effect::info(self)
    }

    fn param_defs(&self) -> Vec<ParamDef> {
        Effect::parameters(self)
    }

    fn check_params(&self, params: &ParamValues) -> EffectResult<()> {
        self.token_from_params(params).map(|_| ())
    }

    fn render(self: Arc<Self>, params: &ParamValues, request: RenderRequest) -> RenderResult<RenderReport> {
        let token = self.token_from_params(params)?;
        let name = Effect::info(&*self).name;
        let mut renderer = TiledRenderer::new(
            self,
            request.src,
            request.dst,
            &request.region,
            request.settings,
        )?;
        for listener in request.listeners {
            renderer.add_listener(listener);
        }
        let settings = renderer.settings();
        let tiles = renderer.tiles().len();

        let started = Instant::now();
        renderer.start(&token)?;

        // The timer exits early when `done` is dropped after join.
        let (done, timer) = mpsc::channel::<()>();
        if let Some(timeout) = request.timeout {
            let handle = renderer.abort_handle();
            thread::Builder::new()
                .name("pfx-render-timeout".into())
                .spawn(move || {
                    if let Err(mpsc::RecvTimeoutError::Timeout) = timer.recv_timeout(timeout) {
                        debug!(?timeout, "render timed out, aborting");
                        handle.abort();
                    }
                })
                .map_err(crate::error::RenderError::Spawn)?;
        }
        let joined = renderer.join();
        drop(done);
        joined?;

        let report = RenderReport {
            effect: name,
            tiles,
            workers: settings.worker_count,
            outcome: renderer.last_outcome().unwrap_or(RenderState::Completed),
            elapsed: started.elapsed(),
        };
        info!(
            effect = name,
            tiles,
            workers = report.workers,
            outcome = %report.outcome,
            elapsed_ms = report.elapsed.as_secs_f64() * 1000.0,
            "render done"
        );
        Ok(report)
    }

    fn render_serial(
        &self,
        params: &ParamValues,
        src: &Surface,
        dst: &mut Surface,
        tiles: &[Vec<Rect>],
        seed: u64,
    ) -> RenderResult<()> {
        let token = self.token_from_params(params)?;
        render_serial(self, &token, src, dst, tiles, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TileContext;
    use crate::effect::Category;
    use crate::error::{EffectError, RenderError};
    use crate::listener::ProgressCounter;
    use pfx_core::ColorBgra;
    use std::sync::RwLock;

    struct Solid;

    impl Effect for Solid {
        type Token = (ColorBgra, u64);
        type State = ();

        fn info(&self) -> EffectInfo {
            EffectInfo::new("test", "solid", "Solid", Category::Render)
        }

        fn parameters(&self) -> Vec<ParamDef> {
            vec![
                ParamDef::color("color", "Color", ColorBgra::WHITE),
                ParamDef::int("delay_ms", "Delay", 0, 1000, 0),
            ]
        }

        fn token_from_params(&self, params: &ParamValues) -> EffectResult<(ColorBgra, u64)> {
            let p = params.resolve(&Effect::parameters(self))?;
            Ok((p.color("color")?, p.int("delay_ms")? as u64))
        }

        fn bind(&self, _: &(ColorBgra, u64), _: &Surface, _: Rect) -> EffectResult<()> {
            Ok(())
        }

        fn render_tile(&self, _: &(), ctx: &mut TileContext<'_, (ColorBgra, u64)>) -> EffectResult<()> {
            let (color, delay) = *ctx.token();
            thread::sleep(Duration::from_millis(delay));
            ctx.writer().fill(color);
            Ok(())
        }
    }

    fn request(size: i32) -> RenderRequest {
        let src = Arc::new(Surface::new(size, size).unwrap());
        let dst = Arc::new(RwLock::new(Surface::new(size, size).unwrap()));
        let mut req = RenderRequest::new(src, dst, Region::from_rect(Rect::from_size(size, size)));
        req.settings = RenderSettings::default().with_workers(2).with_tiles_per_worker(4);
        req
    }

    #[test]
    fn render_by_params() {
        let effect: Arc<dyn DynEffect> = Arc::new(Solid);
        let red = ColorBgra::opaque(255, 0, 0);
        let params = ParamValues::new().with("color", crate::params::ParamValue::Color(red));
        let req = request(16);
        let dst = Arc::clone(&req.dst);

        let report = effect.render(&params, req).unwrap();
        assert_eq!(report.effect, "solid");
        assert_eq!(report.tiles, 8);
        assert_eq!(report.outcome, RenderState::Completed);
        assert!(dst.read().unwrap().pixels().iter().all(|p| *p == red));
    }

    #[test]
    fn bad_params_fail_before_rendering() {
        let effect: Arc<dyn DynEffect> = Arc::new(Solid);
        let params = ParamValues::new().with("delay_ms", crate::params::ParamValue::Int(-1));
        assert!(effect.check_params(&params).is_err());
        match effect.render(&params, request(8)) {
            Err(RenderError::Params(EffectError::InvalidParameter { .. })) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn timeout_aborts_slow_render() {
        let effect: Arc<dyn DynEffect> = Arc::new(Solid);
        let params = ParamValues::new().with("delay_ms", crate::params::ParamValue::Int(30));
        let mut req = request(64);
        req.settings = RenderSettings::default().with_workers(1).with_tiles_per_worker(64);
        req.timeout = Some(Duration::from_millis(50));
        let progress = Arc::new(ProgressCounter::new());
        req.listeners.push(progress.clone());

        let report = effect.render(&params, req).unwrap();
        assert_eq!(report.outcome, RenderState::Aborted);
        assert!(progress.tiles_rendered() < 64);
    }

    #[test]
    fn serial_by_params() {
        let effect: Arc<dyn DynEffect> = Arc::new(Solid);
        let src = Surface::new(4, 4).unwrap();
        let mut dst = Surface::new(4, 4).unwrap();
        let tiles = vec![vec![Rect::new(0, 0, 4, 2)]];
        effect
            .render_serial(&ParamValues::new(), &src, &mut dst, &tiles, 0)
            .unwrap();
        assert_eq!(dst.pixel(3, 1), ColorBgra::WHITE);
        assert_eq!(dst.pixel(3, 2), ColorBgra::TRANSPARENT_BLACK);
    }
}
