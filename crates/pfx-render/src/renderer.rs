//! Tiled parallel renderer.
//!
//! # Overview
//!
//! [`TiledRenderer`] renders one effect over a region of a destination
//! surface, sliced into `worker_count * tiles_per_worker` tiles:
//!
//! ```text
//!  start() ──► controller thread
//!               ├─ source flagged read-only (restored on every exit path)
//!               ├─ destination write-locked, split into per-tile writers
//!               ├─ bind once
//!               ├─ tile 0 rendered right here
//!               └─ pool.scope: worker slot s renders tiles s, s+W, s+2W, ...
//!                   (slot 0 starts at W, tile 0 is already done)
//!  join()  ◄── scope exit drains the pool, faults are surfaced
//! ```
//!
//! # States
//!
//! `Idle → Starting → Running → (Completed | Aborted | Faulted)`. The
//! terminal state is visible through [`TiledRenderer::state`] until
//! [`TiledRenderer::join`] returns the renderer to `Idle`; afterwards it is
//! kept in [`TiledRenderer::last_outcome`].
//!
//! # Faults and abort
//!
//! A kernel error or panic is captured as a [`TileFault`] and stops the
//! remaining tiles; a tile in progress always completes. Faults raised
//! while binding carry no tile index. `join` surfaces
//! the first fault as [`RenderError::Effect`], with later faults of the
//! same run in `suppressed`, and clears the collection. Abort is
//! cooperative: the flag is polled before each tile and
//! [`TiledRenderer::did_abort`] reports whether it actually cut the run
//! short. Destination pixels of finished tiles are never rolled back.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut renderer = TiledRenderer::new(effect, src, dst.clone(), &region, settings)?;
//! renderer.add_listener(progress.clone());
//! renderer.start(&token)?;
//! renderer.join()?;
//! ```

use crate::bound::BoundEffect;
use crate::context::TileContext;
use crate::effect::Effect;
use crate::error::{EffectError, RenderError, RenderResult, TileFault};
use crate::listener::RenderListener;
use crate::settings::RenderSettings;
use crate::writer::{split_tiles, TileWriter};
use pfx_core::{slice_region, ReadOnlyGuard, Rect, Region, SharedSurface, Surface};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// Lifecycle state of a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderState {
    /// No run, or the last run was joined.
    Idle,
    /// `start` was called; the controller has not begun.
    Starting,
    /// Tiles are being rendered.
    Running,
    /// Every tile was rendered.
    Completed,
    /// An abort request stopped the run early.
    Aborted,
    /// A kernel fault stopped the run.
    Faulted,
}

impl RenderState {
    /// `true` for `Completed`, `Aborted` and `Faulted`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Faulted)
    }
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Faulted => "faulted",
        };
        f.write_str(s)
    }
}

/// Cloneable, thread-safe abort request for one renderer.
///
/// Stays valid across runs; [`TiledRenderer::start`] clears it.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// Requests that the current run stop before its next tile. Never blocks.
    pub fn abort(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// `true` once an abort was requested for the current run.
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// State shared between a renderer and its controller.
#[derive(Debug)]
struct RunFlags {
    halt: AtomicBool,
    aborted_early: AtomicBool,
    state: Mutex<RenderState>,
    faults: Mutex<Vec<TileFault>>,
}

impl RunFlags {
    fn new() -> Self {
        Self {
            halt: AtomicBool::new(false),
            aborted_early: AtomicBool::new(false),
            state: Mutex::new(RenderState::Idle),
            faults: Mutex::new(Vec::new()),
        }
    }

    fn reset(&self) {
        self.halt.store(false, Ordering::Release);
        self.aborted_early.store(false, Ordering::Release);
        lock(&self.faults).clear();
        self.set_state(RenderState::Starting);
    }

    fn state(&self) -> RenderState {
        *lock(&self.state)
    }

    fn set_state(&self, state: RenderState) {
        *lock(&self.state) = state;
    }

    fn record(&self, fault: TileFault) {
        self.halt.store(true, Ordering::Release);
        lock(&self.faults).push(fault);
    }

    fn fault_count(&self) -> usize {
        lock(&self.faults).len()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Renders an [`Effect`] over a region using a controller thread and a
/// worker pool.
///
/// `start`, `join` and `abort` take `&mut self` and belong to the owning
/// thread; [`abort_async`](Self::abort_async) and [`AbortHandle`] may be
/// used from anywhere. Dropping a running renderer aborts and joins it.
///
/// The controller holds the destination's write lock for the whole run, so
/// listeners must not lock the destination.
pub struct TiledRenderer<E: Effect> {
    effect: Arc<E>,
    src: Arc<Surface>,
    dst: SharedSurface,
    tiles: Arc<Vec<Vec<Rect>>>,
    settings: RenderSettings,
    pool: Arc<ThreadPool>,
    listeners: Vec<Arc<dyn RenderListener>>,
    run: Arc<RunFlags>,
    abort: AbortHandle,
    controller: Option<JoinHandle<()>>,
    last_outcome: Option<RenderState>,
}

impl<E: Effect> TiledRenderer<E> {
    /// Slices `region` for `settings` and builds the worker pool.
    ///
    /// # Errors
    ///
    /// - [`RenderError::Core`] if `src` and `dst` differ in size
    /// - [`RenderError::ThreadPool`] if the pool cannot be built
    pub fn new(
        effect: Arc<E>,
        src: Arc<Surface>,
        dst: SharedSurface,
        region: &Region,
        settings: RenderSettings,
    ) -> RenderResult<Self> {
        let settings = settings.for_effect(&effect.info());
        let tiles = slice_region(region, settings.tile_count(), src.bounds())?;
        Self::from_tiles(effect, src, dst, tiles, settings)
    }

    /// Uses a prepared tile list instead of slicing a region.
    ///
    /// Tiles must be disjoint; overlapping tiles fail the run with
    /// [`pfx_core::Error::OverlappingTiles`].
    pub fn from_tiles(
        effect: Arc<E>,
        src: Arc<Surface>,
        dst: SharedSurface,
        tiles: Vec<Vec<Rect>>,
        settings: RenderSettings,
    ) -> RenderResult<Self> {
        let info = effect.info();
        let settings = settings.for_effect(&info);
        {
            let dst = dst.read().unwrap_or_else(PoisonError::into_inner);
            if dst.width() != src.width() || dst.height() != src.height() {
                return Err(pfx_core::Error::DimensionMismatch {
                    a_width: dst.width(),
                    a_height: dst.height(),
                    b_width: src.width(),
                    b_height: src.height(),
                }
                .into());
            }
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(settings.worker_count)
            .thread_name(|i| format!("pfx-worker-{i}"))
            .build()?;

        debug!(
            effect = info.name,
            workers = settings.worker_count,
            tiles = tiles.len(),
            "renderer ready"
        );

        Ok(Self {
            effect,
            src,
            dst,
            tiles: Arc::new(tiles),
            settings,
            pool: Arc::new(pool),
            listeners: Vec::new(),
            run: Arc::new(RunFlags::new()),
            abort: AbortHandle::default(),
            controller: None,
            last_outcome: None,
        })
    }

    /// Adds a listener for subsequent runs.
    pub fn add_listener(&mut self, listener: Arc<dyn RenderListener>) {
        self.listeners.push(listener);
    }

    /// Starts a run with a snapshot of `token`.
    ///
    /// A run still in progress is aborted and joined first; a fault it
    /// reported is logged and discarded.
    pub fn start(&mut self, token: &E::Token) -> RenderResult<()> {
        if self.controller.is_some() {
            debug!("start during active run, aborting it");
            self.abort.abort();
            if let Err(err) = self.join() {
                warn!(error = %err, "discarding fault of implicitly aborted run");
            }
        }

        let token = token.clone();
        self.abort.reset();
        self.run.reset();
        self.last_outcome = None;
        for listener in &self.listeners {
            listener.on_starting();
        }

        let job = RunJob {
            effect: Arc::clone(&self.effect),
            src: Arc::clone(&self.src),
            dst: Arc::clone(&self.dst),
            tiles: Arc::clone(&self.tiles),
            pool: Arc::clone(&self.pool),
            listeners: self.listeners.clone(),
            run: Arc::clone(&self.run),
            abort: self.abort.clone(),
            workers: self.settings.worker_count,
            seed: self.settings.seed,
            token,
        };
        let handle = thread::Builder::new()
            .name("pfx-render-controller".into())
            .spawn(move || job.run())
            .map_err(|e| {
                self.run.set_state(RenderState::Idle);
                RenderError::Spawn(e)
            })?;
        self.controller = Some(handle);
        Ok(())
    }

    /// Waits for the current run and surfaces its faults.
    ///
    /// Returns `Ok(())` for completed and aborted runs and when nothing is
    /// running. The fault collection is empty afterwards.
    pub fn join(&mut self) -> RenderResult<()> {
        let Some(handle) = self.controller.take() else {
            return Ok(());
        };
        let joined = handle.join();
        let mut faults = std::mem::take(&mut *lock(&self.run.faults));
        let outcome = match joined {
            Ok(()) => self.run.state(),
            Err(_) => RenderState::Faulted,
        };
        self.last_outcome = Some(outcome);
        self.run.set_state(RenderState::Idle);

        if let Err(payload) = joined {
            if !faults.is_empty() {
                warn!(count = faults.len(), "dropping tile faults of panicked controller");
            }
            return Err(RenderError::ControllerPanicked(panic_message(payload.as_ref())));
        }
        if faults.is_empty() {
            return Ok(());
        }
        let first = faults.remove(0);
        debug!(tile = ?first.tile, suppressed = faults.len(), "surfacing render fault");
        Err(RenderError::Effect {
            source: first.error,
            tile: first.tile,
            suppressed: faults,
        })
    }

    /// Requests an abort and waits for the run to stop.
    ///
    /// Faults captured before the abort took effect are still surfaced.
    pub fn abort(&mut self) -> RenderResult<()> {
        self.abort.abort();
        self.join()
    }

    /// Requests an abort without waiting. Safe from any thread.
    pub fn abort_async(&self) {
        self.abort.abort();
    }

    /// Handle that can request an abort from other threads.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// `true` if an abort request stopped the last run before all tiles
    /// were rendered. A late request that raced with completion reports
    /// `false`.
    pub fn did_abort(&self) -> bool {
        self.run.aborted_early.load(Ordering::Acquire)
    }

    /// Current state.
    pub fn state(&self) -> RenderState {
        self.run.state()
    }

    /// Terminal state of the last joined run.
    pub fn last_outcome(&self) -> Option<RenderState> {
        self.last_outcome
    }

    /// `true` while a controller thread is alive.
    pub fn is_running(&self) -> bool {
        self.controller.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// The tile list, in slice order.
    pub fn tiles(&self) -> &[Vec<Rect>] {
        &self.tiles
    }

    /// Effective settings.
    pub fn settings(&self) -> RenderSettings {
        self.settings
    }

    /// Faults captured by the current run and not yet surfaced by `join`.
    pub fn pending_faults(&self) -> usize {
        self.run.fault_count()
    }

    /// The effect.
    pub fn effect(&self) -> &Arc<E> {
        &self.effect
    }

    /// The source surface.
    pub fn source(&self) -> &Arc<Surface> {
        &self.src
    }

    /// The destination surface.
    pub fn destination(&self) -> &SharedSurface {
        &self.dst
    }
}

impl<E: Effect> Drop for TiledRenderer<E> {
    fn drop(&mut self) {
        if self.controller.is_some() {
            if let Err(err) = self.abort() {
                warn!(error = %err, "render fault discarded on drop");
            }
        }
    }
}

impl<E: Effect> fmt::Debug for TiledRenderer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiledRenderer")
            .field("effect", &self.effect.info().name)
            .field("tiles", &self.tiles.len())
            .field("settings", &self.settings)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Everything the controller thread owns for one run.
struct RunJob<E: Effect> {
    effect: Arc<E>,
    src: Arc<Surface>,
    dst: SharedSurface,
    tiles: Arc<Vec<Vec<Rect>>>,
    pool: Arc<ThreadPool>,
    listeners: Vec<Arc<dyn RenderListener>>,
    run: Arc<RunFlags>,
    abort: AbortHandle,
    workers: usize,
    seed: u64,
    token: E::Token,
}

impl<E: Effect> RunJob<E> {
    fn run(self) {
        let name = self.effect.info().name;
        let _read_only = ReadOnlyGuard::new(&self.src);
        self.run.set_state(RenderState::Running);

        let mut dst = self.dst.write().unwrap_or_else(PoisonError::into_inner);
        let dst_bounds = dst.bounds();
        let bound = panic::catch_unwind(AssertUnwindSafe(|| {
            BoundEffect::bind(&*self.effect, &self.token, &self.src, dst_bounds)
        }));
        let bound = match bound {
            Ok(Ok(bound)) => bound,
            Ok(Err(error)) => {
                warn!(effect = name, %error, "bind failed");
                self.fail(None, error);
                return;
            }
            Err(payload) => {
                let error = EffectError::Panicked(panic_message(payload.as_ref()));
                warn!(effect = name, %error, "bind failed");
                self.fail(None, error);
                return;
            }
        };
        let width = dst.width();
        let writers = match split_tiles(dst.pixels_mut(), width, &self.tiles) {
            Ok(writers) => writers,
            Err(error) => {
                warn!(effect = name, %error, "cannot split destination");
                self.fail(None, error.into());
                return;
            }
        };

        let total = writers.len();
        debug!(effect = name, tiles = total, workers = self.workers, "render started");

        // Tile i belongs to slot i % W, round i / W; slot 0's round 0 is tile 0.
        let mut first = None;
        let mut slots: Vec<Vec<(usize, TileWriter<'_>)>> = (0..self.workers).map(|_| Vec::new()).collect();
        for (index, writer) in writers.into_iter().enumerate() {
            if index == 0 {
                first = Some(writer);
            } else {
                slots[index % self.workers].push((index, writer));
            }
        }

        let runner = TileRunner {
            bound: &bound,
            src: &self.src,
            tiles: &self.tiles,
            listeners: &self.listeners,
            run: &self.run,
            abort: &self.abort,
            seed: self.seed,
            total,
        };

        if let Some(writer) = first {
            let mut token = bound.token_for_worker();
            runner.render(0, 0, writer, &mut token);
        }

        self.pool.scope(|scope| {
            for (slot, assigned) in slots.into_iter().enumerate() {
                if assigned.is_empty() {
                    continue;
                }
                let mut token = bound.token_for_worker();
                let runner = &runner;
                scope.spawn(move |_| {
                    for (index, writer) in assigned {
                        if !runner.render(index, slot, writer, &mut token) {
                            break;
                        }
                    }
                });
            }
        });
        drop(dst);

        let state = if self.run.fault_count() > 0 {
            RenderState::Faulted
        } else if self.run.aborted_early.load(Ordering::Acquire) {
            RenderState::Aborted
        } else {
            RenderState::Completed
        };
        self.run.set_state(state);
        debug!(effect = name, %state, "render finished");
        if state == RenderState::Completed {
            for listener in &self.listeners {
                listener.on_finished();
            }
        }
    }

    fn fail(&self, tile: Option<usize>, error: EffectError) {
        self.run.record(TileFault { tile, worker: 0, error });
        self.run.set_state(RenderState::Faulted);
    }
}

/// Shared, read-only view used by every worker of a run.
struct TileRunner<'r, 'e, E: Effect> {
    bound: &'r BoundEffect<'e, E>,
    src: &'r Surface,
    tiles: &'r [Vec<Rect>],
    listeners: &'r [Arc<dyn RenderListener>],
    run: &'r RunFlags,
    abort: &'r AbortHandle,
    seed: u64,
    total: usize,
}

impl<E: Effect> TileRunner<'_, '_, E> {
    /// Renders one tile; returns `false` when the worker should stop.
    fn render(&self, index: usize, worker: usize, writer: TileWriter<'_>, token: &mut E::Token) -> bool {
        if self.abort.is_aborted() {
            self.run.aborted_early.store(true, Ordering::Release);
            trace!(tile = index, worker, "abort observed");
            return false;
        }
        if self.run.halt.load(Ordering::Acquire) {
            return false;
        }

        let rois = &self.tiles[index];
        let mut ctx = TileContext::new(index, self.total, worker, rois, self.src, writer, token, self.seed);
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.bound.render_tile(&mut ctx)));
        let error = match result {
            Ok(Ok(())) => {
                trace!(tile = index, worker, "tile rendered");
                for listener in self.listeners {
                    listener.on_rendered_tile(rois, index, self.total);
                }
                return true;
            }
            Ok(Err(error)) => error,
            Err(payload) => EffectError::Panicked(panic_message(payload.as_ref())),
        };
        warn!(tile = index, worker, %error, "tile failed");
        self.run.record(TileFault {
            tile: Some(index),
            worker,
            error,
        });
        false
    }
}

/// Renders `tiles` in slice order on the calling thread.
///
/// The reference path for single-threaded comparisons: one token clone for
/// all tiles, the same per-tile random streams as [`TiledRenderer`], and the
/// first fault is returned immediately.
pub fn render_serial<E: Effect>(
    effect: &E,
    token: &E::Token,
    src: &Surface,
    dst: &mut Surface,
    tiles: &[Vec<Rect>],
    seed: u64,
) -> RenderResult<()> {
    let _read_only = ReadOnlyGuard::new(src);
    let fault = |tile: Option<usize>| {
        move |error: EffectError| RenderError::Effect {
            source: error,
            tile,
            suppressed: Vec::new(),
        }
    };
    let bound = BoundEffect::bind(effect, token, src, dst.bounds()).map_err(fault(None))?;
    let width = dst.width();
    let writers = split_tiles(dst.pixels_mut(), width, tiles)?;
    let mut token = bound.token_for_worker();
    for (index, writer) in writers.into_iter().enumerate() {
        let mut ctx = TileContext::new(index, tiles.len(), 0, &tiles[index], src, writer, &mut token, seed);
        bound.render_tile(&mut ctx).map_err(fault(Some(index)))?;
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
