//! Regions: sets of non-overlapping rectangles.
//!
//! A [`Region`] describes the pixels an effect is allowed to write, usually
//! the user's selection. Internally it is kept in canonical y-x banded form:
//!
//! ```text
//!  band 0  ┌────┐      ┌──┐      rows top..bottom, sorted disjoint x spans
//!  band 1  ┌──────────────┐
//!  band 2       ┌───┐
//! ```
//!
//! - bands are sorted top to bottom and never overlap vertically
//! - spans inside a band are sorted, disjoint and never touch
//! - two vertically adjacent bands never carry identical spans
//!
//! Canonical form makes `==` meaningful: two regions covering the same
//! pixels compare equal regardless of how they were built.
//!
//! All boolean operations (union, intersection, difference, xor) are one
//! band sweep parameterised by a combine predicate.
//!
//! # Usage
//!
//! ```rust
//! use pfx_core::{Rect, Region};
//!
//! let a = Region::from_rect(Rect::new(0, 0, 10, 10));
//! let b = Region::from_rect(Rect::new(5, 5, 10, 10));
//!
//! let both = a.union(&b);
//! assert_eq!(both.area(), 175);
//!
//! let clipped = both.intersect_rect(Rect::new(0, 0, 8, 8));
//! assert_eq!(clipped.area(), 64);
//! ```

use crate::rect::{Rect, Scan};

/// Half-open x interval `left..right`.
type Span = (i32, i32);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Band {
    top: i32,
    bottom: i32,
    spans: Vec<Span>,
}

/// A set of pixels represented as disjoint rectangles.
///
/// # Invariants
///
/// - rectangles returned by [`Region::rects`] never overlap
/// - their union is exactly the set of pixels in the region
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Region {
    bands: Vec<Band>,
}

impl Region {
    /// Creates an empty region.
    pub const fn new() -> Self {
        Self { bands: Vec::new() }
    }

    /// Creates a region covering a single rectangle.
    pub fn from_rect(rect: Rect) -> Self {
        let mut region = Self::new();
        if !rect.is_empty() {
            region.bands.push(Band {
                top: rect.top(),
                bottom: rect.bottom(),
                spans: vec![(rect.left(), rect.right())],
            });
        }
        region
    }

    /// Creates a region covering the union of arbitrary rectangles.
    ///
    /// Input rectangles may overlap; the result is normalized.
    pub fn from_rects<I>(rects: I) -> Self
    where
        I: IntoIterator<Item = Rect>,
    {
        let rects: Vec<Rect> = rects.into_iter().filter(|r| !r.is_empty()).collect();
        let mut ys: Vec<i32> = rects.iter().flat_map(|r| [r.top(), r.bottom()]).collect();
        ys.sort_unstable();
        ys.dedup();

        let mut region = Self::new();
        for w in ys.windows(2) {
            let (top, bottom) = (w[0], w[1]);
            let mut spans: Vec<Span> = rects
                .iter()
                .filter(|r| r.top() <= top && r.bottom() >= bottom)
                .map(|r| (r.left(), r.right()))
                .collect();
            spans.sort_unstable();
            region.push_band(top, bottom, merge_spans(spans));
        }
        region
    }

    /// Creates a region approximating the ellipse inscribed in `bounds`.
    ///
    /// Each row covers the pixels whose centers fall inside the ellipse.
    pub fn ellipse(bounds: Rect) -> Self {
        let mut region = Self::new();
        if bounds.is_empty() {
            return region;
        }
        let rx = bounds.width as f64 / 2.0;
        let ry = bounds.height as f64 / 2.0;
        let cx = bounds.x as f64 + rx;
        let cy = bounds.y as f64 + ry;
        for y in bounds.top()..bounds.bottom() {
            let dy = (y as f64 + 0.5 - cy) / ry;
            let t = 1.0 - dy * dy;
            if t <= 0.0 {
                continue;
            }
            let half = rx * t.sqrt();
            let left = (cx - half).round() as i32;
            let right = (cx + half).round() as i32;
            if left < right {
                region.push_band(y, y + 1, vec![(left, right)]);
            }
        }
        region
    }

    /// Returns `true` if the region covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Number of pixels in the region.
    pub fn area(&self) -> u64 {
        self.bands
            .iter()
            .map(|b| {
                let width: u64 = b.spans.iter().map(|&(l, r)| (r - l) as u64).sum();
                width * (b.bottom - b.top) as u64
            })
            .sum()
    }

    /// Smallest rectangle containing the whole region.
    pub fn bounds(&self) -> Rect {
        let (Some(first), Some(last)) = (self.bands.first(), self.bands.last()) else {
            return Rect::default();
        };
        let left = self.bands.iter().filter_map(|b| b.spans.first()).map(|s| s.0).min();
        let right = self.bands.iter().filter_map(|b| b.spans.last()).map(|s| s.1).max();
        match (left, right) {
            (Some(l), Some(r)) => Rect::from_ltrb(l, first.top, r, last.bottom),
            _ => Rect::default(),
        }
    }

    /// Returns `true` if pixel (x, y) is in the region.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.bands
            .iter()
            .find(|b| y >= b.top && y < b.bottom)
            .is_some_and(|b| b.spans.iter().any(|&(l, r)| x >= l && x < r))
    }

    /// The region as disjoint rectangles, one per span per band.
    ///
    /// Ordered top to bottom, then left to right.
    pub fn rects(&self) -> Vec<Rect> {
        self.bands
            .iter()
            .flat_map(|b| {
                b.spans
                    .iter()
                    .map(move |&(l, r)| Rect::from_ltrb(l, b.top, r, b.bottom))
            })
            .collect()
    }

    /// Number of rectangles [`Region::rects`] would return.
    pub fn rect_count(&self) -> usize {
        self.bands.iter().map(|b| b.spans.len()).sum()
    }

    /// The region as single-row runs.
    ///
    /// Ordered top to bottom, and left to right within a row.
    pub fn scans(&self) -> Vec<Scan> {
        let mut scans = Vec::new();
        for band in &self.bands {
            for y in band.top..band.bottom {
                scans.extend(band.spans.iter().map(|&(l, r)| Scan::new(y, l, r)));
            }
        }
        scans
    }

    /// Returns the region shifted by (dx, dy).
    pub fn translate(&self, dx: i32, dy: i32) -> Region {
        Region {
            bands: self
                .bands
                .iter()
                .map(|b| Band {
                    top: b.top + dy,
                    bottom: b.bottom + dy,
                    spans: b.spans.iter().map(|&(l, r)| (l + dx, r + dx)).collect(),
                })
                .collect(),
        }
    }

    /// Pixels in either region.
    pub fn union(&self, other: &Region) -> Region {
        combine(self, other, |a, b| a || b)
    }

    /// Pixels in both regions.
    pub fn intersect(&self, other: &Region) -> Region {
        combine(self, other, |a, b| a && b)
    }

    /// Pixels in `self` but not in `other`.
    pub fn exclude(&self, other: &Region) -> Region {
        combine(self, other, |a, b| a && !b)
    }

    /// Pixels in exactly one of the regions.
    pub fn xor(&self, other: &Region) -> Region {
        combine(self, other, |a, b| a != b)
    }

    /// Clips the region to a rectangle.
    pub fn intersect_rect(&self, rect: Rect) -> Region {
        self.intersect(&Region::from_rect(rect))
    }

    /// Appends a band, coalescing with the previous one when possible.
    fn push_band(&mut self, top: i32, bottom: i32, spans: Vec<Span>) {
        if spans.is_empty() || top >= bottom {
            return;
        }
        if let Some(last) = self.bands.last_mut() {
            if last.bottom == top && last.spans == spans {
                last.bottom = bottom;
                return;
            }
        }
        self.bands.push(Band { top, bottom, spans });
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Region::from_rect(rect)
    }
}

impl FromIterator<Rect> for Region {
    fn from_iter<I: IntoIterator<Item = Rect>>(iter: I) -> Self {
        Region::from_rects(iter)
    }
}

/// Merges sorted, possibly overlapping spans into canonical form.
fn merge_spans(sorted: Vec<Span>) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::with_capacity(sorted.len());
    for (l, r) in sorted {
        if l >= r {
            continue;
        }
        match out.last_mut() {
            Some(last) if l <= last.1 => last.1 = last.1.max(r),
            _ => out.push((l, r)),
        }
    }
    out
}

/// Combines two canonical span lists with a per-pixel predicate.
fn combine_spans(a: &[Span], b: &[Span], op: impl Fn(bool, bool) -> bool) -> Vec<Span> {
    let mut xs: Vec<i32> = a.iter().chain(b).flat_map(|&(l, r)| [l, r]).collect();
    xs.sort_unstable();
    xs.dedup();

    let mut out: Vec<Span> = Vec::new();
    let (mut ia, mut ib) = (0, 0);
    for w in xs.windows(2) {
        let (x0, x1) = (w[0], w[1]);
        while ia < a.len() && a[ia].1 <= x0 {
            ia += 1;
        }
        while ib < b.len() && b[ib].1 <= x0 {
            ib += 1;
        }
        let in_a = ia < a.len() && a[ia].0 <= x0;
        let in_b = ib < b.len() && b[ib].0 <= x0;
        if !op(in_a, in_b) {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.1 == x0 => last.1 = x1,
            _ => out.push((x0, x1)),
        }
    }
    out
}

/// Band sweep shared by every boolean operation.
fn combine(a: &Region, b: &Region, op: impl Fn(bool, bool) -> bool + Copy) -> Region {
    let mut ys: Vec<i32> = a
        .bands
        .iter()
        .chain(&b.bands)
        .flat_map(|band| [band.top, band.bottom])
        .collect();
    ys.sort_unstable();
    ys.dedup();

    let empty: Vec<Span> = Vec::new();
    let mut out = Region::new();
    let (mut ia, mut ib) = (0, 0);
    for w in ys.windows(2) {
        let (top, bottom) = (w[0], w[1]);
        while ia < a.bands.len() && a.bands[ia].bottom <= top {
            ia += 1;
        }
        while ib < b.bands.len() && b.bands[ib].bottom <= top {
            ib += 1;
        }
        let spans_a = match a.bands.get(ia) {
            Some(band) if band.top <= top => &band.spans,
            _ => &empty,
        };
        let spans_b = match b.bands.get(ib) {
            Some(band) if band.top <= top => &band.spans,
            _ => &empty,
        };
        out.push_band(top, bottom, combine_spans(spans_a, spans_b, op));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_region() {
        let r = Region::new();
        assert!(r.is_empty());
        assert_eq!(r.area(), 0);
        assert_eq!(r.bounds(), Rect::default());
        assert!(r.scans().is_empty());
        assert!(Region::from_rect(Rect::new(3, 3, 0, 10)).is_empty());
    }

    #[test]
    fn overlapping_rects_normalize() {
        let r = Region::from_rects([Rect::new(0, 0, 10, 10), Rect::new(5, 5, 10, 10)]);
        assert_eq!(r.area(), 175);
        let rects = r.rects();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(a.intersect(b).is_none(), "{a} overlaps {b}");
            }
        }
        assert_eq!(r.bounds(), Rect::new(0, 0, 15, 15));
    }

    #[test]
    fn canonical_form_is_build_order_independent() {
        let a = Region::from_rects([Rect::new(0, 0, 4, 2), Rect::new(0, 2, 4, 2)]);
        let b = Region::from_rect(Rect::new(0, 0, 4, 4));
        assert_eq!(a, b);
        assert_eq!(a.rect_count(), 1);

        let touching = Region::from_rects([Rect::new(0, 0, 2, 2), Rect::new(2, 0, 2, 2)]);
        assert_eq!(touching, Region::from_rect(Rect::new(0, 0, 4, 2)));
    }

    #[test]
    fn boolean_operations() {
        let a = Region::from_rect(Rect::new(0, 0, 10, 10));
        let b = Region::from_rect(Rect::new(5, 0, 10, 10));
        assert_eq!(a.intersect(&b), Region::from_rect(Rect::new(5, 0, 5, 10)));
        assert_eq!(a.exclude(&b), Region::from_rect(Rect::new(0, 0, 5, 10)));
        assert_eq!(a.xor(&b).area(), 100);
        assert_eq!(a.union(&b), Region::from_rect(Rect::new(0, 0, 15, 10)));
    }

    #[test]
    fn hole_produces_multiple_spans() {
        let outer = Region::from_rect(Rect::new(0, 0, 9, 9));
        let ring = outer.exclude(&Region::from_rect(Rect::new(3, 3, 3, 3)));
        assert_eq!(ring.area(), 81 - 9);
        assert!(!ring.contains(4, 4));
        assert!(ring.contains(2, 4));
        assert_eq!(ring.rect_count(), 4);
    }

    #[test]
    fn scans_order() {
        let ring = Region::from_rect(Rect::new(0, 0, 3, 2))
            .exclude(&Region::from_rect(Rect::new(1, 0, 1, 2)));
        let scans = ring.scans();
        assert_eq!(
            scans,
            vec![
                Scan::new(0, 0, 1),
                Scan::new(0, 2, 3),
                Scan::new(1, 0, 1),
                Scan::new(1, 2, 3),
            ]
        );
    }

    #[test]
    fn ellipse_is_symmetric_and_inside_bounds() {
        let bounds = Rect::new(0, 0, 20, 10);
        let e = Region::ellipse(bounds);
        assert!(!e.is_empty());
        assert!(bounds.contains_rect(&e.bounds()));
        assert!(e.contains(10, 5));
        assert!(!e.contains(0, 0));
        assert!(e.area() < bounds.area());
    }

    #[test]
    fn translate_moves_pixels() {
        let r = Region::from_rect(Rect::new(0, 0, 2, 2)).translate(-1, 3);
        assert_eq!(r.bounds(), Rect::new(-1, 3, 2, 2));
    }
}
