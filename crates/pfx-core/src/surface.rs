//! Pixel surfaces.
//!
//! A [`Surface`] is an owned 2D buffer of [`ColorBgra`] pixels with
//! dimensions fixed at construction. Pixels are stored row-major,
//! top-to-bottom, with no padding between rows:
//!
//! ```text
//! Memory: [B G R A B G R A ...]  ← Row 0
//!         [B G R A B G R A ...]  ← Row 1
//! ```
//!
//! # Read-only hint
//!
//! While a render pass reads a source surface, the renderer flags it
//! read-only with a [`ReadOnlyGuard`]. The flag is a best-effort hint, not
//! a lock: the checked mutators ([`Surface::try_set_pixel`],
//! [`Surface::try_fill`]) refuse to write, the plain ones do not look.
//! Sharing the surface through an `Arc` already prevents mutation during a
//! render; the flag exists so hosts can observe that a pass is in flight.
//!
//! # Destination surfaces
//!
//! Renderers write into a [`SharedSurface`] (`Arc<RwLock<Surface>>`). The
//! render controller holds the write lock for the whole pass and hands
//! each tile a disjoint set of row slices, so no per-pixel locking happens.

use crate::color::ColorBgra;
use crate::error::{Error, Result};
use crate::rect::Rect;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Destination surface shared between a caller and a renderer.
pub type SharedSurface = Arc<RwLock<Surface>>;

/// Owned BGRA pixel buffer.
///
/// # Example
///
/// ```rust
/// use pfx_core::{ColorBgra, Surface};
///
/// let mut s = Surface::new(4, 3).unwrap();
/// s.set_pixel(1, 2, ColorBgra::WHITE);
/// assert_eq!(s.pixel(1, 2), ColorBgra::WHITE);
/// assert_eq!(s.get_pixel(4, 0), None);
/// ```
pub struct Surface {
    width: i32,
    height: i32,
    pixels: Vec<ColorBgra>,
    read_only: AtomicBool,
}

impl Surface {
    /// Creates a surface filled with transparent black.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDimensions`] if either dimension is not positive.
    pub fn new(width: i32, height: i32) -> Result<Self> {
        Self::filled(width, height, ColorBgra::TRANSPARENT_BLACK)
    }

    /// Creates a surface filled with a single color.
    pub fn filled(width: i32, height: i32, color: ColorBgra) -> Result<Self> {
        let len = pixel_count(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![color; len],
            read_only: AtomicBool::new(false),
        })
    }

    /// Wraps existing pixel data.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDimensions`] if the dimensions are not positive or
    /// `pixels.len() != width * height`.
    pub fn from_pixels(width: i32, height: i32, pixels: Vec<ColorBgra>) -> Result<Self> {
        let len = pixel_count(width, height)?;
        if pixels.len() != len {
            return Err(Error::InvalidDimensions {
                width,
                height,
                reason: format!("expected {} pixels, got {}", len, pixels.len()),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            read_only: AtomicBool::new(false),
        })
    }

    /// Creates a surface by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: i32, height: i32, mut f: F) -> Result<Self>
    where
        F: FnMut(i32, i32) -> ColorBgra,
    {
        let len = pixel_count(width, height)?;
        let mut pixels = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self::from_pixels(width, height, pixels)
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Full-surface rectangle at the origin.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Returns `true` if (x, y) addresses a pixel of this surface.
    #[inline]
    pub fn is_visible(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// All pixels, row-major.
    #[inline]
    pub fn pixels(&self) -> &[ColorBgra] {
        &self.pixels
    }

    /// All pixels, row-major, mutable.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [ColorBgra] {
        &mut self.pixels
    }

    /// Raw BGRA bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Consumes the surface, returning its pixels.
    pub fn into_pixels(self) -> Vec<ColorBgra> {
        self.pixels
    }

    /// Pixel at (x, y), or `None` outside the surface.
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<ColorBgra> {
        self.is_visible(x, y).then(|| self.pixels[self.index(x, y)])
    }

    /// Pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is outside the surface.
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> ColorBgra {
        assert!(
            self.is_visible(x, y),
            "pixel ({x}, {y}) out of bounds for surface {}x{}",
            self.width,
            self.height
        );
        self.pixels[self.index(x, y)]
    }

    /// Pixel at (x, y) without bounds checks.
    ///
    /// # Safety
    ///
    /// `0 <= x < width` and `0 <= y < height` must hold.
    #[inline]
    pub unsafe fn pixel_unchecked(&self, x: i32, y: i32) -> ColorBgra {
        // SAFETY: caller guarantees the coordinates are in bounds.
        unsafe { *self.pixels.get_unchecked(self.index(x, y)) }
    }

    /// Pixel at (x, y) with coordinates clamped to the surface edges.
    #[inline]
    pub fn pixel_clamped(&self, x: i32, y: i32) -> ColorBgra {
        let x = x.clamp(0, self.width - 1);
        let y = y.clamp(0, self.height - 1);
        self.pixels[self.index(x, y)]
    }

    /// Row `y` as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `y` is outside the surface.
    #[inline]
    pub fn row(&self, y: i32) -> &[ColorBgra] {
        assert!(y >= 0 && y < self.height, "row {y} out of bounds");
        let start = self.index(0, y);
        &self.pixels[start..start + self.width as usize]
    }

    /// Row `y` as a mutable slice.
    ///
    /// # Panics
    ///
    /// Panics if `y` is outside the surface.
    #[inline]
    pub fn row_mut(&mut self, y: i32) -> &mut [ColorBgra] {
        assert!(y >= 0 && y < self.height, "row {y} out of bounds");
        let start = self.index(0, y);
        let width = self.width as usize;
        &mut self.pixels[start..start + width]
    }

    /// Row `y` without bounds checks.
    ///
    /// # Safety
    ///
    /// `0 <= y < height` must hold.
    #[inline]
    pub unsafe fn row_unchecked(&self, y: i32) -> &[ColorBgra] {
        let start = self.index(0, y);
        // SAFETY: caller guarantees the row exists, so the whole range is in bounds.
        unsafe { self.pixels.get_unchecked(start..start + self.width as usize) }
    }

    /// Sets the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is outside the surface.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: ColorBgra) {
        assert!(
            self.is_visible(x, y),
            "pixel ({x}, {y}) out of bounds for surface {}x{}",
            self.width,
            self.height
        );
        let idx = self.index(x, y);
        self.pixels[idx] = color;
    }

    /// Sets a pixel, honouring bounds and the read-only hint.
    pub fn try_set_pixel(&mut self, x: i32, y: i32, color: ColorBgra) -> Result<()> {
        self.ensure_writable()?;
        if !self.is_visible(x, y) {
            return Err(Error::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let idx = self.index(x, y);
        self.pixels[idx] = color;
        Ok(())
    }

    /// Fills the whole surface.
    pub fn fill(&mut self, color: ColorBgra) {
        self.pixels.fill(color);
    }

    /// Fills the whole surface, honouring the read-only hint.
    pub fn try_fill(&mut self, color: ColorBgra) -> Result<()> {
        self.ensure_writable()?;
        self.fill(color);
        Ok(())
    }

    /// Fills the part of `rect` that lies on the surface.
    pub fn fill_rect(&mut self, rect: Rect, color: ColorBgra) {
        let Some(clip) = rect.intersect(&self.bounds()) else {
            return;
        };
        for y in clip.top()..clip.bottom() {
            let row = self.row_mut(y);
            row[clip.left() as usize..clip.right() as usize].fill(color);
        }
    }

    /// Copies `rect` from `src` to the same position in this surface.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] if the surfaces differ in size.
    pub fn copy_rect_from(&mut self, src: &Surface, rect: Rect) -> Result<()> {
        if src.width != self.width || src.height != self.height {
            return Err(Error::DimensionMismatch {
                a_width: self.width,
                a_height: self.height,
                b_width: src.width,
                b_height: src.height,
            });
        }
        let Some(clip) = rect.intersect(&self.bounds()) else {
            return Ok(());
        };
        let (l, r) = (clip.left() as usize, clip.right() as usize);
        for y in clip.top()..clip.bottom() {
            self.row_mut(y)[l..r].copy_from_slice(&src.row(y)[l..r]);
        }
        Ok(())
    }

    /// Returns `true` while a render pass is reading this surface.
    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Acquire)
    }

    /// Sets the read-only hint. Prefer [`ReadOnlyGuard`].
    #[inline]
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Release);
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.is_read_only() {
            Err(Error::ReadOnly)
        } else {
            Ok(())
        }
    }
}

impl Clone for Surface {
    /// Copies the pixels; the clone starts writable.
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
            read_only: AtomicBool::new(false),
        }
    }
}

impl PartialEq for Surface {
    /// Compares dimensions and pixels; the read-only hint is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.pixels == other.pixels
    }
}

impl Eq for Surface {}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

/// Flags a surface read-only for its lifetime.
///
/// Writability is restored on drop, including during unwinding, so the
/// hint cannot leak past a failed render.
pub struct ReadOnlyGuard<'a> {
    surface: &'a Surface,
}

impl<'a> ReadOnlyGuard<'a> {
    /// Marks `surface` read-only until the guard is dropped.
    pub fn new(surface: &'a Surface) -> Self {
        surface.set_read_only(true);
        Self { surface }
    }
}

impl Drop for ReadOnlyGuard<'_> {
    fn drop(&mut self) {
        self.surface.set_read_only(false);
    }
}

fn pixel_count(width: i32, height: i32) -> Result<usize> {
    if width <= 0 || height <= 0 {
        return Err(Error::InvalidDimensions {
            width,
            height,
            reason: "width and height must be > 0".into(),
        });
    }
    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| Error::InvalidDimensions {
            width,
            height,
            reason: "pixel count overflows".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_dimensions() {
        assert!(matches!(Surface::new(0, 5), Err(Error::InvalidDimensions { .. })));
        assert!(matches!(Surface::new(5, -1), Err(Error::InvalidDimensions { .. })));
        assert!(Surface::from_pixels(2, 2, vec![ColorBgra::BLACK; 3]).is_err());
    }

    #[test]
    fn addressing() {
        let s = Surface::from_fn(3, 2, |x, y| ColorBgra::from_bgra(x as u8, y as u8, 0, 255)).unwrap();
        assert_eq!(s.pixel(2, 1), ColorBgra::from_bgra(2, 1, 0, 255));
        assert_eq!(s.row(1)[0], ColorBgra::from_bgra(0, 1, 0, 255));
        assert_eq!(s.get_pixel(-1, 0), None);
        assert_eq!(s.pixel_clamped(10, -3), s.pixel(2, 0));
        assert_eq!(unsafe { s.pixel_unchecked(1, 1) }, s.pixel(1, 1));
        assert_eq!(unsafe { s.row_unchecked(0) }, s.row(0));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn checked_pixel_panics() {
        let s = Surface::new(2, 2).unwrap();
        s.pixel(2, 0);
    }

    #[test]
    fn fill_rect_clips() {
        let mut s = Surface::new(4, 4).unwrap();
        s.fill_rect(Rect::new(2, 2, 10, 10), ColorBgra::WHITE);
        assert_eq!(s.pixel(3, 3), ColorBgra::WHITE);
        assert_eq!(s.pixel(1, 1), ColorBgra::TRANSPARENT_BLACK);
    }

    #[test]
    fn copy_rect_checks_size() {
        let src = Surface::filled(4, 4, ColorBgra::WHITE).unwrap();
        let mut dst = Surface::new(4, 4).unwrap();
        dst.copy_rect_from(&src, Rect::new(1, 1, 2, 2)).unwrap();
        assert_eq!(dst.pixel(1, 1), ColorBgra::WHITE);
        assert_eq!(dst.pixel(0, 0), ColorBgra::TRANSPARENT_BLACK);

        let small = Surface::new(2, 2).unwrap();
        assert!(matches!(
            dst.copy_rect_from(&small, Rect::new(0, 0, 1, 1)),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn read_only_guard_restores() {
        let mut s = Surface::new(2, 2).unwrap();
        {
            let _guard = ReadOnlyGuard::new(&s);
            assert!(s.is_read_only());
        }
        assert!(!s.is_read_only());
        s.set_read_only(true);
        assert_eq!(s.try_fill(ColorBgra::WHITE), Err(Error::ReadOnly));
        assert_eq!(s.try_set_pixel(0, 0, ColorBgra::WHITE), Err(Error::ReadOnly));
        s.set_read_only(false);
        assert!(s.try_set_pixel(0, 0, ColorBgra::WHITE).is_ok());
        assert!(matches!(
            s.try_set_pixel(5, 0, ColorBgra::WHITE),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn clone_and_eq_ignore_hint() {
        let s = Surface::filled(2, 2, ColorBgra::BLACK).unwrap();
        s.set_read_only(true);
        let c = s.clone();
        assert!(!c.is_read_only());
        assert_eq!(s, c);
        assert_eq!(s.as_bytes().len(), 16);
    }
}
