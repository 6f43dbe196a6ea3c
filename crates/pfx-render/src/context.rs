//! What a kernel sees while rendering one tile.

use crate::writer::TileWriter;
use pfx_core::{ColorBgra, Rect, Surface};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Per-tile rendering context.
///
/// Holds the tile's rectangles, the read-only source, write access to
/// exactly the tile's destination pixels, the worker's own token clone and
/// a random stream seeded from the run seed and the tile index, so noise
/// kernels are reproducible regardless of which worker renders the tile.
pub struct TileContext<'a, T> {
    index: usize,
    total: usize,
    worker: usize,
    rois: &'a [Rect],
    src: &'a Surface,
    writer: TileWriter<'a>,
    token: &'a mut T,
    rng: StdRng,
}

/// Disjoint mutable parts of a [`TileContext`], for kernels that need the
/// writer together with the token or the random stream.
pub struct TileParts<'c, 'a, T> {
    /// Destination rows of the tile
    pub writer: &'c mut TileWriter<'a>,
    /// The worker's token clone
    pub token: &'c mut T,
    /// Tile random stream
    pub rng: &'c mut StdRng,
}

impl<'a, T> TileContext<'a, T> {
    /// Builds a context. `seed` is the run seed; it is mixed with `index`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: usize,
        total: usize,
        worker: usize,
        rois: &'a [Rect],
        src: &'a Surface,
        writer: TileWriter<'a>,
        token: &'a mut T,
        seed: u64,
    ) -> Self {
        Self {
            index,
            total,
            worker,
            rois,
            src,
            writer,
            token,
            rng: StdRng::seed_from_u64(tile_seed(seed, index)),
        }
    }

    /// Tile index within the run.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of tiles in the run.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Worker slot rendering this tile; 0 is the controller.
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// The tile's rectangles, clipped to the surface.
    pub fn rois(&self) -> &'a [Rect] {
        self.rois
    }

    /// Source surface. The returned reference is independent of `self`,
    /// so it can be held while writing rows.
    pub fn src(&self) -> &'a Surface {
        self.src
    }

    /// Token of this worker.
    pub fn token(&self) -> &T {
        &*self.token
    }

    /// Mutable token of this worker, for lazily derived data.
    pub fn token_mut(&mut self) -> &mut T {
        &mut *self.token
    }

    /// Tile random stream.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Destination writer of the tile.
    pub fn writer(&mut self) -> &mut TileWriter<'a> {
        &mut self.writer
    }

    /// Shortcut for `writer().rows_mut()`.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = (i32, i32, &mut [ColorBgra])> + '_ {
        self.writer.rows_mut()
    }

    /// Borrows writer, token and random stream at once.
    pub fn parts(&mut self) -> TileParts<'_, 'a, T> {
        TileParts {
            writer: &mut self.writer,
            token: &mut *self.token,
            rng: &mut self.rng,
        }
    }
}

/// Seed of the random stream of tile `index` in a run seeded with `seed`.
///
/// SplitMix64 finalizer over the combined value.
pub fn tile_seed(seed: u64, index: usize) -> u64 {
    let mut z = seed ^ (index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::split_tiles;
    use rand::RngCore;

    #[test]
    fn seeds_differ_per_tile_and_run() {
        assert_ne!(tile_seed(0, 0), tile_seed(0, 1));
        assert_ne!(tile_seed(0, 3), tile_seed(1, 3));
        assert_eq!(tile_seed(42, 7), tile_seed(42, 7));
    }

    #[test]
    fn context_exposes_tile() {
        let src = Surface::filled(4, 2, ColorBgra::WHITE).unwrap();
        let mut dst = Surface::new(4, 2).unwrap();
        let tiles = vec![vec![Rect::new(0, 1, 4, 1)]];
        let mut token = 5u32;
        {
            let mut writers = split_tiles(dst.pixels_mut(), 4, &tiles).unwrap();
            let writer = writers.pop().unwrap();
            let mut ctx = TileContext::new(0, 1, 0, &tiles[0], &src, writer, &mut token, 9);
            assert_eq!(ctx.rois(), &[Rect::new(0, 1, 4, 1)]);
            let first = ctx.rng().next_u32();

            let s = ctx.src();
            let parts = ctx.parts();
            *parts.token += 1;
            for (x, y, row) in parts.writer.rows_mut() {
                for (i, px) in row.iter_mut().enumerate() {
                    *px = s.pixel(x + i as i32, y);
                }
            }

            let mut again = StdRng::seed_from_u64(tile_seed(9, 0));
            assert_eq!(first, again.next_u32());
        }
        assert_eq!(token, 6);
        assert_eq!(dst.pixel(2, 1), ColorBgra::WHITE);
        assert_eq!(dst.pixel(2, 0), ColorBgra::TRANSPARENT_BLACK);
    }
}
