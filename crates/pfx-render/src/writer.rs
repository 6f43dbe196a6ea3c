//! Per-tile destination access.
//!
//! The destination surface is shared by every worker of a run, but tiles
//! are disjoint. [`split_tiles`] turns the destination pixel buffer into one
//! [`TileWriter`] per tile by cutting it into row spans with
//! `split_at_mut`, so each worker receives plain `&mut` slices and no
//! destination write needs a lock or `unsafe`:
//!
//! ```text
//!  buffer: [.....AAAA......BBBB....AAAA.....BBBB...]
//!               └──┘       └──┘    └──┘     └──┘
//!             tile 0     tile 1   tile 0   tile 1
//! ```
//!
//! Spans are handed out in buffer order and must not overlap; an overlap
//! is reported as [`Error::OverlappingTiles`] instead of aliasing.

use pfx_core::{ColorBgra, Error, Rect, Result, Surface};

/// One destination row segment owned by a tile.
#[derive(Debug)]
struct RowSpan<'a> {
    x: i32,
    y: i32,
    pixels: &'a mut [ColorBgra],
}

/// Write access to exactly the pixels of one tile.
#[derive(Debug, Default)]
pub struct TileWriter<'a> {
    spans: Vec<RowSpan<'a>>,
}

impl<'a> TileWriter<'a> {
    /// Iterates the tile's row spans as `(x, y, pixels)`, in rectangle
    /// order and top to bottom within each rectangle. `pixels[i]` is the
    /// destination pixel at `(x + i, y)`.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = (i32, i32, &mut [ColorBgra])> + '_ {
        self.spans.iter_mut().map(|s| (s.x, s.y, &mut *s.pixels))
    }

    /// Iterates the spans read-only.
    pub fn rows(&self) -> impl Iterator<Item = (i32, i32, &[ColorBgra])> + '_ {
        self.spans.iter().map(|s| (s.x, s.y, &*s.pixels))
    }

    /// Number of row spans.
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// Total number of writable pixels.
    pub fn pixel_count(&self) -> usize {
        self.spans.iter().map(|s| s.pixels.len()).sum()
    }

    /// Returns `true` if the tile covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|s| s.pixels.is_empty())
    }

    /// Fills every pixel of the tile.
    pub fn fill(&mut self, color: ColorBgra) {
        for (_, _, row) in self.rows_mut() {
            row.fill(color);
        }
    }

    /// Copies the tile's pixels from `src` at the same coordinates.
    ///
    /// # Panics
    ///
    /// Panics if a span lies outside `src`.
    pub fn copy_from(&mut self, src: &Surface) {
        for (x, y, row) in self.rows_mut() {
            let start = x as usize;
            row.copy_from_slice(&src.row(y)[start..start + row.len()]);
        }
    }
}

/// Splits a destination buffer into one writer per tile.
///
/// `pixels` is a row-major buffer `width` pixels wide. Every rectangle is
/// clipped to the buffer; rectangles outside it contribute nothing.
///
/// # Errors
///
/// - [`Error::InvalidDimensions`] if `pixels.len()` is not a multiple of `width`
/// - [`Error::OverlappingTiles`] if two rectangles share a pixel
pub fn split_tiles<'a>(
    pixels: &'a mut [ColorBgra],
    width: i32,
    tiles: &[Vec<Rect>],
) -> Result<Vec<TileWriter<'a>>> {
    if width <= 0 || pixels.len() % width as usize != 0 {
        return Err(Error::InvalidDimensions {
            width,
            height: 0,
            reason: format!("buffer of {} pixels is not a whole number of rows", pixels.len()),
        });
    }
    let stride = width as usize;
    let bounds = Rect::from_size(width, (pixels.len() / stride) as i32);

    // (start, end, tile, order within tile, x, y)
    let mut spans: Vec<(usize, usize, usize, usize, i32, i32)> = Vec::new();
    for (tile, rects) in tiles.iter().enumerate() {
        let mut order = 0;
        for rect in rects.iter().filter_map(|r| r.intersect(&bounds)) {
            for y in rect.top()..rect.bottom() {
                let start = y as usize * stride + rect.left() as usize;
                spans.push((start, start + rect.width as usize, tile, order, rect.left(), y));
                order += 1;
            }
        }
    }
    spans.sort_unstable_by_key(|s| (s.0, s.1));

    for pair in spans.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.1 > next.0 {
            return Err(Error::OverlappingTiles {
                first: prev.2.min(next.2),
                second: prev.2.max(next.2),
                y: next.5,
            });
        }
    }

    let mut writers: Vec<Vec<(usize, RowSpan<'a>)>> = (0..tiles.len()).map(|_| Vec::new()).collect();
    let mut rest: &'a mut [ColorBgra] = pixels;
    let mut consumed = 0;
    for (start, end, tile, order, x, y) in spans {
        let tail = std::mem::take(&mut rest);
        let (_, tail) = tail.split_at_mut(start - consumed);
        let (span, tail) = tail.split_at_mut(end - start);
        rest = tail;
        consumed = end;
        writers[tile].push((order, RowSpan { x, y, pixels: span }));
    }

    Ok(writers
        .into_iter()
        .map(|mut spans| {
            spans.sort_unstable_by_key(|(order, _)| *order);
            TileWriter {
                spans: spans.into_iter().map(|(_, span)| span).collect(),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writers_cover_their_tiles_only() {
        let mut surface = Surface::new(6, 4).unwrap();
        let tiles = vec![
            vec![Rect::new(0, 0, 6, 1)],
            vec![Rect::new(0, 1, 6, 2), Rect::new(2, 3, 2, 1)],
        ];
        {
            let mut writers = split_tiles(surface.pixels_mut(), 6, &tiles).unwrap();
            assert_eq!(writers.len(), 2);
            assert_eq!(writers[0].pixel_count(), 6);
            assert_eq!(writers[1].pixel_count(), 14);
            writers[0].fill(ColorBgra::WHITE);
            for (x, y, row) in writers[1].rows_mut() {
                for (i, px) in row.iter_mut().enumerate() {
                    *px = ColorBgra::from_bgra((x + i as i32) as u8, y as u8, 0, 255);
                }
            }
        }
        assert_eq!(surface.pixel(5, 0), ColorBgra::WHITE);
        assert_eq!(surface.pixel(4, 2), ColorBgra::from_bgra(4, 2, 0, 255));
        assert_eq!(surface.pixel(3, 3), ColorBgra::from_bgra(3, 3, 0, 255));
        assert_eq!(surface.pixel(0, 3), ColorBgra::TRANSPARENT_BLACK);
    }

    #[test]
    fn spans_keep_rectangle_order() {
        let mut pixels = vec![ColorBgra::BLACK; 16];
        // Rectangles listed bottom-up; rows_mut must follow that order.
        let tiles = vec![vec![Rect::new(0, 3, 4, 1), Rect::new(0, 0, 4, 1)]];
        let mut writers = split_tiles(&mut pixels, 4, &tiles).unwrap();
        let ys: Vec<i32> = writers[0].rows_mut().map(|(_, y, _)| y).collect();
        assert_eq!(ys, vec![3, 0]);
    }

    #[test]
    fn overlap_is_rejected() {
        let mut pixels = vec![ColorBgra::BLACK; 16];
        let tiles = vec![vec![Rect::new(0, 0, 3, 2)], vec![Rect::new(2, 1, 2, 2)]];
        let err = split_tiles(&mut pixels, 4, &tiles).unwrap_err();
        assert_eq!(err, Error::OverlappingTiles { first: 0, second: 1, y: 1 });
    }

    #[test]
    fn rects_are_clipped() {
        let mut pixels = vec![ColorBgra::BLACK; 16];
        let tiles = vec![vec![Rect::new(-2, -2, 4, 4)], vec![], vec![Rect::new(10, 10, 2, 2)]];
        let writers = split_tiles(&mut pixels, 4, &tiles).unwrap();
        assert_eq!(writers[0].pixel_count(), 4);
        assert!(writers[1].is_empty());
        assert!(writers[2].is_empty());
    }

    #[test]
    fn copy_from_source() {
        let src = Surface::from_fn(4, 4, |x, y| ColorBgra::from_bgra(x as u8, y as u8, 9, 255)).unwrap();
        let mut dst = Surface::new(4, 4).unwrap();
        {
            let tiles = vec![vec![Rect::new(1, 1, 2, 2)]];
            let mut writers = split_tiles(dst.pixels_mut(), 4, &tiles).unwrap();
            writers[0].copy_from(&src);
            assert_eq!(writers[0].rows().count(), 2);
        }
        assert_eq!(dst.pixel(2, 2), src.pixel(2, 2));
        assert_eq!(dst.pixel(0, 0), ColorBgra::TRANSPARENT_BLACK);
    }

    #[test]
    fn ragged_buffer_is_rejected() {
        let mut pixels = vec![ColorBgra::BLACK; 10];
        assert!(split_tiles(&mut pixels, 4, &[]).is_err());
    }
}
