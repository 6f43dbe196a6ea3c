//! 8-bit BGRA pixel type.
//!
//! [`ColorBgra`] is the single pixel format every surface and kernel works
//! in: four 8-bit channels stored in B, G, R, A memory order. Colour
//! channels are straight (not premultiplied); kernels that average
//! several pixels weight colour by alpha themselves.
//!
//! # Memory Layout
//!
//! ```text
//! byte:  0  1  2  3
//!        B  G  R  A
//! ```
//!
//! As a packed `u32` (see [`ColorBgra::to_u32`]) the layout is
//! `0xAARRGGBB` on every platform.

use bytemuck::{Pod, Zeroable};

/// A single BGRA pixel with 8 bits per channel.
///
/// # Example
///
/// ```rust
/// use pfx_core::ColorBgra;
///
/// let c = ColorBgra::from_rgba(255, 128, 0, 255);
/// assert_eq!(c.r, 255);
/// assert_eq!(c.to_u32(), 0xFFFF8000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
#[repr(C)]
pub struct ColorBgra {
    /// Blue channel
    pub b: u8,
    /// Green channel
    pub g: u8,
    /// Red channel
    pub r: u8,
    /// Alpha channel (255 = opaque)
    pub a: u8,
}

impl ColorBgra {
    /// Fully transparent black, the initial content of new surfaces.
    pub const TRANSPARENT_BLACK: ColorBgra = ColorBgra::from_bgra(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: ColorBgra = ColorBgra::from_bgra(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: ColorBgra = ColorBgra::from_bgra(255, 255, 255, 255);

    /// Creates a color from channels in memory order.
    #[inline]
    pub const fn from_bgra(b: u8, g: u8, r: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Creates a color from channels in conventional RGBA order.
    #[inline]
    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Creates an opaque color.
    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba(r, g, b, 255)
    }

    /// Packs into `0xAARRGGBB`.
    #[inline]
    pub const fn to_u32(self) -> u32 {
        (self.b as u32) | ((self.g as u32) << 8) | ((self.r as u32) << 16) | ((self.a as u32) << 24)
    }

    /// Unpacks from `0xAARRGGBB`.
    #[inline]
    pub const fn from_u32(bgra: u32) -> Self {
        Self {
            b: bgra as u8,
            g: (bgra >> 8) as u8,
            r: (bgra >> 16) as u8,
            a: (bgra >> 24) as u8,
        }
    }

    /// Returns the same color with a different alpha.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Perceptual intensity (luma) of the color channels, ignoring alpha.
    ///
    /// Uses Rec.601 weights in 16-bit fixed point.
    #[inline]
    pub const fn intensity(self) -> u8 {
        ((7471 * self.b as u32 + 38470 * self.g as u32 + 19595 * self.r as u32) >> 16) as u8
    }

    /// Linear interpolation between two colors, per channel.
    ///
    /// `t` is not clamped; channel results are clamped to `0..=255`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pfx_core::ColorBgra;
    ///
    /// let mid = ColorBgra::lerp(ColorBgra::BLACK, ColorBgra::WHITE, 0.5);
    /// assert_eq!(mid.r, 127);
    /// assert_eq!(mid.a, 255);
    /// ```
    #[inline]
    pub fn lerp(from: ColorBgra, to: ColorBgra, t: f64) -> ColorBgra {
        let mix = |a: u8, b: u8| clamp_to_byte_f64(a as f64 + t * (b as f64 - a as f64));
        ColorBgra::from_bgra(
            mix(from.b, to.b),
            mix(from.g, to.g),
            mix(from.r, to.r),
            mix(from.a, to.a),
        )
    }

    /// Alpha-weighted average of a set of samples.
    ///
    /// Color channels are weighted by their alpha so fully transparent
    /// samples do not darken the result; alpha is the plain mean.
    /// Returns transparent black for an empty slice or all-transparent input.
    pub fn blend(samples: &[ColorBgra]) -> ColorBgra {
        if samples.is_empty() {
            return ColorBgra::TRANSPARENT_BLACK;
        }
        let (mut a, mut b, mut g, mut r) = (0u64, 0u64, 0u64, 0u64);
        for c in samples {
            let ca = c.a as u64;
            a += ca;
            b += c.b as u64 * ca;
            g += c.g as u64 * ca;
            r += c.r as u64 * ca;
        }
        if a == 0 {
            return ColorBgra::TRANSPARENT_BLACK;
        }
        let n = samples.len() as u64;
        ColorBgra::from_bgra(
            (b / a) as u8,
            (g / a) as u8,
            (r / a) as u8,
            ((a + n / 2) / n).min(255) as u8,
        )
    }
}

impl std::fmt::Display for ColorBgra {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

impl std::str::FromStr for ColorBgra {
    type Err = String;

    /// Parses `#RRGGBB`, `#RRGGBBAA` or the same without `#`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("invalid color '{s}': {e}"))
        };
        if !hex.is_ascii() {
            return Err(format!("invalid color '{s}': expected hex digits"));
        }
        match hex.len() {
            6 => Ok(ColorBgra::opaque(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(ColorBgra::from_rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(format!("invalid color '{s}': expected RRGGBB or RRGGBBAA")),
        }
    }
}

/// Clamps an integer channel value to `0..=255`.
#[inline]
pub fn clamp_to_byte(v: i64) -> u8 {
    v.clamp(0, 255) as u8
}

/// Clamps a floating-point channel value to `0..=255`, truncating.
#[inline]
pub fn clamp_to_byte_f64(v: f64) -> u8 {
    if v.is_nan() {
        0
    } else {
        v.clamp(0.0, 255.0) as u8
    }
}
