//! Rectangle and scanline types for region-of-interest processing.
//!
//! This module provides the geometric primitives regions and tiles are
//! built from:
//! - [`Rect`] - Axis-aligned rectangle with signed origin
//! - [`Scan`] - A single-row horizontal run, the unit the region slicer
//!   distributes between tiles
//!
//! # Coordinate System
//!
//! All coordinates use the standard image convention:
//! - Origin (0, 0) is at the **top-left** corner
//! - X increases to the right
//! - Y increases downward
//!
//! ```text
//! (0,0) ────────► X
//!   │
//!   │   ┌──────────┐
//!   │   │   Rect   │
//!   │   └──────────┘
//!   ▼
//!   Y
//! ```
//!
//! Coordinates are signed: a selection may start left of or above the
//! surface and is clipped to the surface bounds before rendering.
//!
//! # Usage
//!
//! ```rust
//! use pfx_core::Rect;
//!
//! let rect = Rect::new(10, 20, 100, 50);
//! assert!(rect.contains(15, 25));
//! assert!(!rect.contains(5, 25));
//!
//! let other = Rect::new(50, 40, 100, 50);
//! let overlap = rect.intersect(&other).unwrap();
//! assert_eq!(overlap, Rect::new(50, 40, 60, 30));
//! ```

/// A rectangle defined by origin (x, y) and dimensions (width, height).
///
/// Left/top edges are inclusive, right/bottom edges are exclusive.
///
/// # Invariants
///
/// - A rectangle with non-positive width or height is empty
/// - Empty rectangles never intersect anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the left edge (inclusive)
    pub x: i32,
    /// Y coordinate of the top edge (inclusive)
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Rect {
    /// Creates a new rectangle with the given origin and dimensions.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from its left, top, right and bottom edges.
    ///
    /// Right and bottom are exclusive. Swapped edges produce an empty rect.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pfx_core::Rect;
    ///
    /// let rect = Rect::from_ltrb(10, 20, 110, 70);
    /// assert_eq!(rect.width, 100);
    /// assert_eq!(rect.height, 50);
    /// ```
    #[inline]
    pub const fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    /// Creates a rectangle from origin (0, 0) with given dimensions.
    #[inline]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// X coordinate of the left edge (inclusive).
    #[inline]
    pub const fn left(&self) -> i32 {
        self.x
    }

    /// Y coordinate of the top edge (inclusive).
    #[inline]
    pub const fn top(&self) -> i32 {
        self.y
    }

    /// X coordinate of the right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Y coordinate of the bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Area in pixels; zero for empty rectangles.
    #[inline]
    pub const fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width as u64 * self.height as u64
        }
    }

    /// Returns `true` if the rectangle has no pixels.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns `true` if the point (px, py) is inside this rectangle.
    #[inline]
    pub const fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Returns `true` if this rectangle fully contains another.
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns the intersection of this rectangle with another.
    ///
    /// Returns `None` if the rectangles don't share a pixel.
    #[inline]
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::from_ltrb(x, y, right, bottom))
        } else {
            None
        }
    }

    /// Returns the bounding box that contains both rectangles.
    ///
    /// Empty inputs are ignored.
    #[inline]
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect::from_ltrb(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Returns this rectangle translated by (dx, dy).
    #[inline]
    pub const fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grows the rectangle by `amount` on every side (shrinks if negative).
    #[inline]
    pub const fn inflate(&self, amount: i32) -> Rect {
        Rect::new(
            self.x - amount,
            self.y - amount,
            self.width + 2 * amount,
            self.height + 2 * amount,
        )
    }

    /// Iterates the single-row runs covering this rectangle, top to bottom.
    pub fn scans(&self) -> impl Iterator<Item = Scan> + '_ {
        let (left, right) = (self.x, self.right());
        let rows = if self.is_empty() { 0..0 } else { self.y..self.bottom() };
        rows.map(move |y| Scan::new(y, left, right))
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rect({}, {}, {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// A horizontal run of pixels on a single row.
///
/// Covers `left..right` (right exclusive) on row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scan {
    /// Row
    pub y: i32,
    /// First column (inclusive)
    pub left: i32,
    /// End column (exclusive)
    pub right: i32,
}

impl Scan {
    /// Creates a run on row `y` covering `left..right`.
    #[inline]
    pub const fn new(y: i32, left: i32, right: i32) -> Self {
        Self { y, left, right }
    }

    /// Number of pixels in the run.
    #[inline]
    pub const fn len(&self) -> i32 {
        if self.right > self.left {
            self.right - self.left
        } else {
            0
        }
    }

    /// Returns `true` if the run covers no pixels.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.right <= self.left
    }

    /// The run as a one-row rectangle.
    #[inline]
    pub const fn to_rect(&self) -> Rect {
        Rect::from_ltrb(self.left, self.y, self.right, self.y + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_and_area() {
        let r = Rect::new(-5, 3, 10, 4);
        assert_eq!(r.right(), 5);
        assert_eq!(r.bottom(), 7);
        assert_eq!(r.area(), 40);
        assert_eq!(Rect::new(0, 0, -3, 4).area(), 0);
    }

    #[test]
    fn intersect_disjoint_and_touching() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(a.intersect(&Rect::new(10, 0, 5, 5)), None);
        assert_eq!(a.intersect(&Rect::new(20, 20, 5, 5)), None);
        assert_eq!(a.intersect(&Rect::new(-5, -5, 8, 8)), Some(Rect::new(0, 0, 3, 3)));
    }

    #[test]
    fn union_skips_empty() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(a.union(&Rect::default()), a);
        assert_eq!(Rect::default().union(&a), a);
        assert_eq!(a.union(&Rect::new(20, 5, 5, 10)), Rect::new(0, 0, 25, 15));
    }

    #[test]
    fn contains_edges() {
        let r = Rect::new(10, 10, 100, 100);
        assert!(r.contains(10, 10));
        assert!(r.contains(109, 109));
        assert!(!r.contains(110, 110));
        assert!(r.contains_rect(&Rect::new(20, 20, 10, 10)));
    }

    #[test]
    fn inflate_and_translate() {
        let r = Rect::new(10, 10, 4, 4);
        assert_eq!(r.inflate(2), Rect::new(8, 8, 8, 8));
        assert_eq!(r.inflate(-2), Rect::new(12, 12, 0, 0));
        assert_eq!(r.translate(-10, 5), Rect::new(0, 15, 4, 4));
    }

    #[test]
    fn scans_cover_rect() {
        let r = Rect::new(2, 3, 4, 2);
        let scans: Vec<_> = r.scans().collect();
        assert_eq!(scans, vec![Scan::new(3, 2, 6), Scan::new(4, 2, 6)]);
        assert_eq!(scans[0].len(), 4);
        assert_eq!(scans[1].to_rect(), Rect::new(2, 4, 4, 1));
        assert_eq!(Rect::new(0, 0, 0, 5).scans().count(), 0);
    }
}
