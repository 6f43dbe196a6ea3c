//! Worker and tile counts of a render.

use crate::effect::EffectInfo;
use serde::{Deserialize, Serialize};

/// Scheduling settings of a [`TiledRenderer`](crate::TiledRenderer).
///
/// The region is sliced into `worker_count * tiles_per_worker` tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Worker threads in the pool
    pub worker_count: usize,
    /// Tiles per worker; more tiles balance uneven kernels better
    pub tiles_per_worker: usize,
    /// Run seed mixed into every tile's random stream
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            worker_count: std::thread::available_parallelism().map_or(1, |n| n.get()),
            tiles_per_worker: 4,
            seed: 0,
        }
    }
}

impl RenderSettings {
    /// Sets the worker count.
    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Sets the tiles per worker.
    pub fn with_tiles_per_worker(mut self, tiles_per_worker: usize) -> Self {
        self.tiles_per_worker = tiles_per_worker;
        self
    }

    /// Sets the run seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Settings actually used for `info`: counts are at least 1 and
    /// single-threaded effects get exactly one worker.
    pub fn for_effect(&self, info: &EffectInfo) -> Self {
        let worker_count = if info.is_single_threaded() {
            1
        } else {
            self.worker_count.max(1)
        };
        Self {
            worker_count,
            tiles_per_worker: self.tiles_per_worker.max(1),
            seed: self.seed,
        }
    }

    /// Number of tiles the region is sliced into.
    pub fn tile_count(&self) -> usize {
        self.worker_count.max(1) * self.tiles_per_worker.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{Category, EffectFlags};

    #[test]
    fn single_threaded_effects_get_one_worker() {
        let info = EffectInfo::new("t", "t", "T", Category::Render).with_flags(EffectFlags::SINGLE_THREADED);
        let s = RenderSettings::default().with_workers(8).for_effect(&info);
        assert_eq!(s.worker_count, 1);
        assert_eq!(s.tile_count(), 4);
    }

    #[test]
    fn counts_are_clamped() {
        let info = EffectInfo::new("t", "t", "T", Category::Render);
        let s = RenderSettings::default()
            .with_workers(0)
            .with_tiles_per_worker(0)
            .with_seed(7)
            .for_effect(&info);
        assert_eq!((s.worker_count, s.tiles_per_worker, s.seed), (1, 1, 7));
        assert_eq!(RenderSettings::default().with_workers(3).tile_count(), 12);
    }
}
