//! Render lifecycle notifications.
//!
//! Listeners are called from the thread that calls `start`
//! ([`RenderListener::on_starting`]), from the controller and worker threads
//! ([`RenderListener::on_rendered_tile`], possibly concurrently), and from
//! the controller ([`RenderListener::on_finished`]). Implementations must be
//! thread-safe.

use pfx_core::Rect;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Observer of one renderer's runs. All methods default to no-ops.
pub trait RenderListener: Send + Sync {
    /// A run is about to start.
    fn on_starting(&self) {}

    /// Tile `index` of `total` finished. `rois` are the tile's rectangles.
    ///
    /// Tile 0 is always reported before any other tile of the same run.
    fn on_rendered_tile(&self, rois: &[Rect], index: usize, total: usize) {
        let _ = (rois, index, total);
    }

    /// The run rendered every tile. Not called for aborted or faulted runs.
    fn on_finished(&self) {}
}

/// Lock-free progress listener.
#[derive(Debug)]
pub struct ProgressCounter {
    starts: AtomicUsize,
    tiles: AtomicUsize,
    total: AtomicUsize,
    pixels: AtomicU64,
    first_tile: AtomicUsize,
    finished: AtomicBool,
}

impl Default for ProgressCounter {
    fn default() -> Self {
        Self {
            starts: AtomicUsize::new(0),
            tiles: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            pixels: AtomicU64::new(0),
            first_tile: AtomicUsize::new(usize::MAX),
            finished: AtomicBool::new(false),
        }
    }
}

impl ProgressCounter {
    /// Fresh counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs started.
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::Acquire)
    }

    /// Tiles rendered in the current run.
    pub fn tiles_rendered(&self) -> usize {
        self.tiles.load(Ordering::Acquire)
    }

    /// Tile count of the current run, once the first tile reported.
    pub fn total_tiles(&self) -> usize {
        self.total.load(Ordering::Acquire)
    }

    /// Pixels covered by rendered tiles.
    pub fn pixels_rendered(&self) -> u64 {
        self.pixels.load(Ordering::Acquire)
    }

    /// Index of the first tile reported in the current run.
    pub fn first_tile(&self) -> Option<usize> {
        match self.first_tile.load(Ordering::Acquire) {
            usize::MAX => None,
            i => Some(i),
        }
    }

    /// `true` once the current run completed.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Fraction of tiles rendered, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        match self.total_tiles() {
            0 => 0.0,
            total => self.tiles_rendered() as f64 / total as f64,
        }
    }
}

impl RenderListener for ProgressCounter {
    fn on_starting(&self) {
        self.starts.fetch_add(1, Ordering::AcqRel);
        self.tiles.store(0, Ordering::Release);
        self.total.store(0, Ordering::Release);
        self.pixels.store(0, Ordering::Release);
        self.first_tile.store(usize::MAX, Ordering::Release);
        self.finished.store(false, Ordering::Release);
    }

    fn on_rendered_tile(&self, rois: &[Rect], index: usize, total: usize) {
        let _ = self
            .first_tile
            .compare_exchange(usize::MAX, index, Ordering::AcqRel, Ordering::Acquire);
        self.total.store(total, Ordering::Release);
        self.pixels
            .fetch_add(rois.iter().map(|r| r.area()).sum(), Ordering::AcqRel);
        self.tiles.fetch_add(1, Ordering::AcqRel);
    }

    fn on_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_tiles_and_pixels() {
        let p = ProgressCounter::new();
        p.on_starting();
        assert_eq!(p.first_tile(), None);
        p.on_rendered_tile(&[Rect::new(0, 0, 4, 1)], 0, 4);
        p.on_rendered_tile(&[Rect::new(0, 1, 4, 2), Rect::new(0, 5, 1, 1)], 2, 4);
        assert_eq!(p.tiles_rendered(), 2);
        assert_eq!(p.pixels_rendered(), 13);
        assert_eq!(p.first_tile(), Some(0));
        assert!((p.fraction() - 0.5).abs() < 1e-12);
        assert!(!p.is_finished());
        p.on_finished();
        assert!(p.is_finished());

        p.on_starting();
        assert_eq!(p.starts(), 2);
        assert_eq!(p.tiles_rendered(), 0);
        assert_eq!(p.first_tile(), None);
    }
}
