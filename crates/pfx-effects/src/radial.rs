//! Radial (rotational) blur in 16.16 fixed point.
//!
//! Every output pixel averages the source along an arc around the center:
//! the offset from the center is rotated `n = q^2 (30 + q^2)` times by a
//! small step in each direction, with sine and cosine replaced by their
//! small-angle approximations. Samples that leave the surface are skipped.

use crate::sample::{check_quality, AlphaSum, MAX_QUALITY, MIN_QUALITY};
use pfx_core::{Rect, Surface};
use pfx_render::{
    ensure_same_bounds, Category, Effect, EffectInfo, EffectResult, ParamDef, ParamValues, TileContext,
};

/// Radial blur parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialBlurToken {
    /// Arc length in degrees
    pub angle: f64,
    /// Center offset, in half-extents from the middle of the surface
    pub offset: (f64, f64),
    /// Sampling quality, 1..=5
    pub quality: i64,
}

impl Default for RadialBlurToken {
    fn default() -> Self {
        Self {
            angle: 2.0,
            offset: (0.0, 0.0),
            quality: 2,
        }
    }
}

/// Fixed-point constants of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadialBlurState {
    fcx: i64,
    fcy: i64,
    steps: i64,
    step: i64,
}

/// Radial blur effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct RadialBlurEffect;

/// Rotates a 16.16 vector by the small angle `fr` (radians * 65536).
#[inline]
fn rotate(fx: &mut i64, fy: &mut i64, fr: i64) {
    let (cx, cy) = (*fx, *fy);
    let cos_term = (fr * fr) >> 11;
    *fx = cx - (((cy >> 8) * fr) >> 8) - (((cx >> 14) * cos_term) >> 8);
    *fy = cy + (((cx >> 8) * fr) >> 8) - (((cy >> 14) * cos_term) >> 8);
}

impl Effect for RadialBlurEffect {
    type Token = RadialBlurToken;
    type State = RadialBlurState;

    fn info(&self) -> EffectInfo {
        EffectInfo::new("pfx", "radial-blur", "Radial Blur", Category::Blurs)
    }

    fn parameters(&self) -> Vec<ParamDef> {
        let d = RadialBlurToken::default();
        vec![
            ParamDef::float("angle", "Angle", 0.0, 360.0, d.angle),
            ParamDef::point("offset", "Offset", -2.0, 2.0, d.offset),
            ParamDef::int("quality", "Quality", MIN_QUALITY, MAX_QUALITY, d.quality),
        ]
    }

    fn token_from_params(&self, params: &ParamValues) -> EffectResult<RadialBlurToken> {
        let p = params.resolve(&self.parameters())?;
        Ok(RadialBlurToken {
            angle: p.float("angle")?,
            offset: p.point("offset")?,
            quality: p.int("quality")?,
        })
    }

    fn bind(&self, token: &RadialBlurToken, src: &Surface, dst_bounds: Rect) -> EffectResult<RadialBlurState> {
        ensure_same_bounds(src, dst_bounds)?;
        check_quality(token.quality)?;
        let (w, h) = (src.width() as i64, src.height() as i64);
        let q2 = token.quality * token.quality;
        let steps = q2 * (30 + q2);
        let fr = (token.angle * std::f64::consts::PI * 65536.0 / 181.0) as i64;
        Ok(RadialBlurState {
            fcx: (w << 15) + (token.offset.0 * (w << 15) as f64) as i64,
            fcy: (h << 15) + (token.offset.1 * (h << 15) as f64) as i64,
            steps,
            step: fr / steps,
        })
    }

    fn render_tile(&self, state: &RadialBlurState, ctx: &mut TileContext<'_, RadialBlurToken>) -> EffectResult<()> {
        let src = ctx.src();
        let (w, h) = (src.width() as i64, src.height() as i64);
        let &RadialBlurState { fcx, fcy, steps, step } = state;
        let accept = |u: i64, v: i64| u > 0 && v > 0 && u < w && v < h;

        for (x0, y, row) in ctx.rows_mut() {
            for (i, px) in row.iter_mut().enumerate() {
                let x = x0 + i as i32;
                let mut sum = AlphaSum::default();
                sum.add(src.pixel(x, y));

                let fx = ((x as i64) << 16) - fcx;
                let fy = ((y as i64) << 16) - fcy;
                let (mut ox1, mut oy1, mut ox2, mut oy2) = (fx, fy, fx, fy);
                for _ in 0..steps {
                    rotate(&mut ox1, &mut oy1, step);
                    rotate(&mut ox2, &mut oy2, -step);

                    let u1 = (ox1 + fcx + 32768) >> 16;
                    let v1 = (oy1 + fcy + 32768) >> 16;
                    if accept(u1, v1) {
                        sum.add(src.pixel(u1 as i32, v1 as i32));
                    }
                    let u2 = (ox2 + fcx + 32768) >> 16;
                    let v2 = (oy2 + fcy + 32768) >> 16;
                    if accept(u2, v2) {
                        sum.add(src.pixel(u2 as i32, v2 as i32));
                    }
                }
                *px = sum.finish();
            }
        }
        Ok(())
    }
}
