//! Zoom blur in 16.16 fixed point.
//!
//! Each output pixel averages 64 samples taken while its offset from the
//! center shrinks geometrically by `amount / 16384` per step. Samples that
//! fall outside the surface are skipped.

use crate::sample::AlphaSum;
use pfx_core::{Rect, Surface};
use pfx_render::{
    ensure_same_bounds, Category, Effect, EffectInfo, EffectResult, ParamDef, ParamValues, TileContext,
};

const STEPS: usize = 64;

/// Zoom blur parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomBlurToken {
    /// Zoom strength, 0..=100
    pub amount: i64,
    /// Center offset, in half-extents from the middle of the surface
    pub offset: (f64, f64),
}

impl Default for ZoomBlurToken {
    fn default() -> Self {
        Self {
            amount: 10,
            offset: (0.0, 0.0),
        }
    }
}

/// Zoom blur effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoomBlurEffect;

impl Effect for ZoomBlurEffect {
    type Token = ZoomBlurToken;
    /// Fixed-point center.
    type State = (i64, i64);

    fn info(&self) -> EffectInfo {
        EffectInfo::new("pfx", "zoom-blur", "Zoom Blur", Category::Blurs)
    }

    fn parameters(&self) -> Vec<ParamDef> {
        let d = ZoomBlurToken::default();
        vec![
            ParamDef::int("amount", "Zoom Amount", 0, 100, d.amount),
            ParamDef::point("offset", "Offset", -2.0, 2.0, d.offset),
        ]
    }

    fn token_from_params(&self, params: &ParamValues) -> EffectResult<ZoomBlurToken> {
        let p = params.resolve(&self.parameters())?;
        Ok(ZoomBlurToken {
            amount: p.int("amount")?,
            offset: p.point("offset")?,
        })
    }

    fn bind(&self, token: &ZoomBlurToken, src: &Surface, dst_bounds: Rect) -> EffectResult<(i64, i64)> {
        ensure_same_bounds(src, dst_bounds)?;
        let (w, h) = (src.width() as i64, src.height() as i64);
        let fox = (w as f64 * token.offset.0 * 32768.0) as i64;
        let foy = (h as f64 * token.offset.1 * 32768.0) as i64;
        Ok((fox + (w << 15), foy + (h << 15)))
    }

    fn render_tile(&self, &(fcx, fcy): &(i64, i64), ctx: &mut TileContext<'_, ZoomBlurToken>) -> EffectResult<()> {
        let fz = ctx.token().amount;
        let src = ctx.src();

        for (x0, y, row) in ctx.rows_mut() {
            for (i, px) in row.iter_mut().enumerate() {
                let x = x0 + i as i32;
                let mut sum = AlphaSum::default();
                sum.add(src.pixel(x, y));

                let mut fx = ((x as i64) << 16) - fcx;
                let mut fy = ((y as i64) << 16) - fcy;
                for _ in 0..STEPS {
                    fx -= ((fx >> 4) * fz) >> 10;
                    fy -= ((fy >> 4) * fz) >> 10;
                    let u = (fx + fcx + 32768) >> 16;
                    let v = (fy + fcy + 32768) >> 16;
                    if let Some(c) = src.get_pixel(u as i32, v as i32) {
                        sum.add(c);
                    }
                }
                *px = sum.finish();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfx_core::ColorBgra;
    use pfx_render::render_serial;

    fn blur(src: &Surface, token: ZoomBlurToken) -> Surface {
        let mut dst = Surface::new(src.width(), src.height()).unwrap();
        render_serial(&ZoomBlurEffect, &token, src, &mut dst, &[vec![src.bounds()]], 0).unwrap();
        dst
    }

    #[test]
    fn zero_amount_is_identity() {
        let src = Surface::from_fn(9, 9, |x, y| ColorBgra::from_bgra((x * 9) as u8, (y * 9) as u8, 50, 255)).unwrap();
        let token = ZoomBlurToken { amount: 0, ..Default::default() };
        assert_eq!(blur(&src, token), src);
    }

    #[test]
    fn pulls_color_from_the_center() {
        let mut src = Surface::filled(33, 33, ColorBgra::BLACK).unwrap();
        src.fill_rect(Rect::new(10, 10, 13, 13), ColorBgra::WHITE);
        let dst = blur(&src, ZoomBlurToken { amount: 100, ..Default::default() });
        // Just outside the white square, on a ray through it
        let near = dst.pixel(24, 16);
        assert!(near.r > 0 && near.r < 255);
        assert_eq!(near.a, 255);
        // 64 steps shrink the corner offset by about a third, not enough to reach it
        assert_eq!(dst.pixel(0, 0), ColorBgra::BLACK);
    }

    #[test]
    fn edge_pixels_average_only_samples_inside() {
        // Center past the bottom-right corner: that corner's samples walk off the surface
        let c = ColorBgra::from_bgra(40, 80, 120, 128);
        let src = Surface::filled(16, 16, c).unwrap();
        let token = ZoomBlurToken { amount: 100, offset: (2.0, 2.0) };
        let (fcx, _) = ZoomBlurEffect.bind(&token, &src, src.bounds()).unwrap();
        assert_eq!(fcx, 24 << 16);
        let dst = blur(&src, token);
        assert_eq!(dst.pixel(15, 15), c);
        assert_eq!(dst.pixel(0, 15), c);
    }

    #[test]
    fn offset_moves_the_center() {
        let src = Surface::new(20, 10).unwrap();
        let token = ZoomBlurToken { amount: 10, offset: (1.0, -1.0) };
        assert_eq!(ZoomBlurEffect.bind(&token, &src, src.bounds()).unwrap(), (20 << 16, 0));
    }
}
