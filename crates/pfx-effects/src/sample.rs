//! Alpha-weighted sample accumulation shared by the blur kernels, and the
//! sampling quality bounds shared by the supersampling kernels.

use pfx_core::ColorBgra;
use pfx_render::{EffectError, EffectResult};

/// Lowest sampling quality.
pub(crate) const MIN_QUALITY: i64 = 1;
/// Highest sampling quality.
pub(crate) const MAX_QUALITY: i64 = 5;

/// Rejects a `quality` outside `MIN_QUALITY..=MAX_QUALITY`.
pub(crate) fn check_quality(quality: i64) -> EffectResult<()> {
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        return Err(EffectError::InvalidParameter {
            name: "quality".into(),
            value: quality.to_string(),
            min: MIN_QUALITY.to_string(),
            max: MAX_QUALITY.to_string(),
        });
    }
    Ok(())
}

/// Running sums of alpha-premultiplied samples.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AlphaSum {
    b: i64,
    g: i64,
    r: i64,
    a: i64,
    count: i64,
}

impl AlphaSum {
    #[inline]
    pub(crate) fn add(&mut self, c: ColorBgra) {
        let a = c.a as i64;
        self.b += c.b as i64 * a;
        self.g += c.g as i64 * a;
        self.r += c.r as i64 * a;
        self.a += a;
        self.count += 1;
    }

    /// Color is the alpha-weighted mean, alpha the plain mean over all
    /// accepted samples. Transparent black if every sample was transparent.
    #[inline]
    pub(crate) fn finish(&self) -> ColorBgra {
        if self.a == 0 {
            return ColorBgra::TRANSPARENT_BLACK;
        }
        ColorBgra::from_bgra(
            (self.b / self.a) as u8,
            (self.g / self.a) as u8,
            (self.r / self.a) as u8,
            (self.a / self.count) as u8,
        )
    }
}
