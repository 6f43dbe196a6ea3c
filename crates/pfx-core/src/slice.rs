//! Region slicing for parallel rendering.
//!
//! [`slice_region`] partitions a region into `slice_count` row-aligned,
//! pairwise disjoint tiles of roughly equal size:
//!
//! 1. The region is flattened into single-row runs ([`Scan`]), top to
//!    bottom and left to right.
//! 2. The run list is cut into `slice_count` contiguous index ranges of
//!    about `runs / slice_count` runs each. When there are at least two
//!    slices, slice 0 keeps at most one run so it can be rendered on the
//!    calling thread before workers spin up; slice 1 starts right after it
//!    and absorbs the runs slice 0 gave up.
//! 3. Each slice's runs become one-row rectangles, are clipped to the
//!    surface bounds, and vertically adjacent rectangles with identical
//!    left/right edges are coalesced in a single greedy pass.
//!
//! ```text
//!  runs:   0 | 1 2 3 4 | 5 6 7 8 9 | 10 11 12 13 14
//!  slice:  0 |    1    |     2     |       3
//! ```
//!
//! Trailing slices are empty when there are fewer runs than slices; an
//! empty region yields `slice_count` empty slices.

use crate::error::{Error, Result};
use crate::rect::{Rect, Scan};
use crate::region::Region;

/// Splits `region` into `slice_count` disjoint rectangle lists.
///
/// The union of all slices equals `region` clipped to `bounds`.
///
/// # Errors
///
/// Returns [`Error::InvalidSliceCount`] when `slice_count` is zero.
///
/// # Example
///
/// ```rust
/// use pfx_core::{slice_region, Rect, Region};
///
/// let region = Region::from_rect(Rect::new(0, 0, 8, 10));
/// let slices = slice_region(&region, 3, Rect::from_size(8, 10)).unwrap();
///
/// assert_eq!(slices.len(), 3);
/// // The first slice is a single scanline
/// assert_eq!(slices[0], vec![Rect::new(0, 0, 8, 1)]);
/// let total: u64 = slices.iter().flatten().map(|r| r.area()).sum();
/// assert_eq!(total, 80);
/// ```
pub fn slice_region(region: &Region, slice_count: usize, bounds: Rect) -> Result<Vec<Vec<Rect>>> {
    slice_scans(&region.scans(), slice_count, bounds)
}

/// Same as [`slice_region`], starting from a flat rectangle list.
///
/// The rectangles must not overlap; they are flattened into runs in the
/// order given, row by row within each rectangle.
pub fn slice_rects(rects: &[Rect], slice_count: usize, bounds: Rect) -> Result<Vec<Vec<Rect>>> {
    let scans: Vec<Scan> = rects.iter().flat_map(|r| r.scans()).collect();
    slice_scans(&scans, slice_count, bounds)
}

/// Index range `[start, end)` of the runs assigned to slice `index`.
///
/// Exposed so callers can reason about tile sizes without materializing them.
pub fn slice_range(run_count: usize, slice_count: usize, index: usize) -> (usize, usize) {
    let even = |i: usize| (run_count * i / slice_count).min(run_count);
    let (mut start, end) = (even(index), even(index + 1));
    if slice_count >= 2 {
        let first_end = even(1).min(1);
        match index {
            0 => return (0, first_end),
            1 => start = first_end,
            _ => {}
        }
    }
    (start, end.max(start))
}

fn slice_scans(scans: &[Scan], slice_count: usize, bounds: Rect) -> Result<Vec<Vec<Rect>>> {
    if slice_count == 0 {
        return Err(Error::InvalidSliceCount(0));
    }
    Ok((0..slice_count)
        .map(|i| {
            let (start, end) = slice_range(scans.len(), slice_count, i);
            coalesce(&scans[start..end], bounds)
        })
        .collect())
}

/// Clips runs to `bounds` and merges exactly adjacent rectangles in order.
fn coalesce(scans: &[Scan], bounds: Rect) -> Vec<Rect> {
    let mut out: Vec<Rect> = Vec::new();
    for clipped in scans.iter().filter_map(|s| s.to_rect().intersect(&bounds)) {
        match out.last_mut() {
            Some(last)
                if last.x == clipped.x
                    && last.width == clipped.width
                    && last.bottom() == clipped.y =>
            {
                last.height += clipped.height;
            }
            _ => out.push(clipped),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_area(slices: &[Vec<Rect>]) -> u64 {
        slices.iter().flatten().map(|r| r.area()).sum()
    }

    #[test]
    fn zero_slices_is_rejected() {
        let region = Region::from_rect(Rect::new(0, 0, 4, 4));
        assert_eq!(
            slice_region(&region, 0, Rect::from_size(4, 4)),
            Err(Error::InvalidSliceCount(0))
        );
    }

    #[test]
    fn empty_region_gives_empty_slices() {
        let slices = slice_region(&Region::new(), 5, Rect::from_size(10, 10)).unwrap();
        assert_eq!(slices.len(), 5);
        assert!(slices.iter().all(|s| s.is_empty()));
    }

    #[test]
    fn single_slice_takes_everything() {
        let region = Region::from_rect(Rect::new(0, 0, 6, 6));
        let slices = slice_region(&region, 1, Rect::from_size(6, 6)).unwrap();
        assert_eq!(slices, vec![vec![Rect::new(0, 0, 6, 6)]]);
    }

    #[test]
    fn first_slice_is_one_run_and_second_absorbs_rest() {
        let region = Region::from_rect(Rect::new(0, 0, 5, 20));
        let slices = slice_region(&region, 4, Rect::from_size(5, 20)).unwrap();
        assert_eq!(slices[0], vec![Rect::new(0, 0, 5, 1)]);
        assert_eq!(slices[1], vec![Rect::new(0, 1, 5, 9)]);
        assert_eq!(slices[2], vec![Rect::new(0, 10, 5, 5)]);
        assert_eq!(slices[3], vec![Rect::new(0, 15, 5, 5)]);
    }

    #[test]
    fn more_slices_than_runs() {
        let region = Region::from_rect(Rect::new(0, 0, 3, 2));
        let slices = slice_region(&region, 5, Rect::from_size(3, 2)).unwrap();
        assert_eq!(slices.len(), 5);
        assert_eq!(total_area(&slices), 6);
        assert!(slices[0].len() <= 1);
        assert!(slices.iter().filter(|s| s.is_empty()).count() >= 3);
    }

    #[test]
    fn clipping_to_bounds() {
        let region = Region::from_rect(Rect::new(-4, -4, 12, 12));
        let bounds = Rect::from_size(6, 6);
        let slices = slice_region(&region, 3, bounds).unwrap();
        assert_eq!(total_area(&slices), 36);
        for r in slices.iter().flatten() {
            assert!(bounds.contains_rect(r));
        }
    }

    #[test]
    fn coalescing_only_merges_exact_neighbours() {
        // Two columns per row: runs alternate left/right so nothing merges.
        let region = Region::from_rect(Rect::new(0, 0, 6, 4))
            .exclude(&Region::from_rect(Rect::new(2, 0, 2, 4)));
        let slices = slice_region(&region, 1, Rect::from_size(6, 4)).unwrap();
        assert_eq!(slices[0].len(), 8);
        assert_eq!(total_area(&slices), 16);
    }

    #[test]
    fn slice_ranges_cover_all_runs() {
        for runs in [0usize, 1, 2, 3, 7, 64, 1000] {
            for count in 1..12 {
                let mut next = 0;
                for i in 0..count {
                    let (start, end) = slice_range(runs, count, i);
                    assert_eq!(start, next, "runs={runs} count={count} slice={i}");
                    assert!(end >= start);
                    next = end;
                }
                assert_eq!(next, runs, "runs={runs} count={count}");
                if count >= 2 {
                    let (s, e) = slice_range(runs, count, 0);
                    assert!(e - s <= 1);
                }
            }
        }
    }

    #[test]
    fn slice_rects_matches_region_order() {
        let rects = [Rect::new(0, 0, 4, 3)];
        let a = slice_rects(&rects, 2, Rect::from_size(4, 3)).unwrap();
        let b = slice_region(&Region::from_rect(rects[0]), 2, Rect::from_size(4, 3)).unwrap();
        assert_eq!(a, b);
    }
}
