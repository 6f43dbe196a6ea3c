//! Twist: rotates pixels around the center, more strongly near it.
//!
//! Inside the largest centered circle each sample is rotated by
//! `t^3 * twist / 100` radians, where `t = 1 - radius / max_radius` and
//! `twist = amount^2 * sign(amount)`. Pixels outside the circle are
//! copied. Each output pixel averages `quality^2` samples on a rotated
//! grid.

use pfx_core::{ColorBgra, Rect, Surface};
use pfx_render::{
    ensure_same_bounds, Category, Effect, EffectInfo, EffectResult, ParamDef, ParamValues, TileContext,
};

/// Twist parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwistToken {
    /// Twist strength and direction, -200..=200
    pub amount: i64,
    /// Supersampling quality, 1..=5
    pub quality: i64,
}

impl Default for TwistToken {
    fn default() -> Self {
        Self { amount: 45, quality: 2 }
    }
}

/// Rotated-grid sample offsets for `quality^2` samples, relative to the
/// pixel origin. Quality 1 samples the pixel origin itself.
pub fn rgss_offsets(quality: i64) -> Vec<(f64, f64)> {
    let q = quality.max(1);
    let n = q * q;
    if n == 1 {
        return vec![(0.0, 0.0)];
    }
    (0..n)
        .map(|i| {
            let y = (i + 1) as f64 / (n + 1) as f64;
            let x = (y * q as f64).fract();
            (x - 0.5, y - 0.5)
        })
        .collect()
}

/// Per-run geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct TwistState {
    half_width: f64,
    half_height: f64,
    max_radius: f64,
    twist: f64,
    offsets: Vec<(f64, f64)>,
}

/// Twist effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwistEffect;

impl Effect for TwistEffect {
    type Token = TwistToken;
    type State = TwistState;

    fn info(&self) -> EffectInfo {
        EffectInfo::new("pfx", "twist", "Twist", Category::Distort)
    }

    fn parameters(&self) -> Vec<ParamDef> {
        let d = TwistToken::default();
        vec![
            ParamDef::int("amount", "Amount", -200, 200, d.amount),
            ParamDef::int("quality", "Antialias", 1, 5, d.quality),
        ]
    }

    fn token_from_params(&self, params: &ParamValues) -> EffectResult<TwistToken> {
        let p = params.resolve(&self.parameters())?;
        Ok(TwistToken {
            amount: p.int("amount")?,
            quality: p.int("quality")?,
        })
    }

    fn bind(&self, token: &TwistToken, src: &Surface, dst_bounds: Rect) -> EffectResult<TwistState> {
        ensure_same_bounds(src, dst_bounds)?;
        let half_width = src.width() as f64 / 2.0;
        let half_height = src.height() as f64 / 2.0;
        let amount = token.amount as f64;
        Ok(TwistState {
            half_width,
            half_height,
            max_radius: half_width.min(half_height),
            twist: amount * amount * amount.signum(),
            offsets: rgss_offsets(token.quality),
        })
    }

    fn render_tile(&self, state: &TwistState, ctx: &mut TileContext<'_, TwistToken>) -> EffectResult<()> {
        let src = ctx.src();
        let TwistState {
            half_width: hw,
            half_height: hh,
            max_radius,
            twist,
            ..
        } = *state;
        let limit = (max_radius + 1.0) * (max_radius + 1.0);
        let mut samples = Vec::with_capacity(state.offsets.len());

        for (x0, y, row) in ctx.rows_mut() {
            let j = y as f64 - hh;
            for (k, px) in row.iter_mut().enumerate() {
                let x = x0 + k as i32;
                let i = x as f64 - hw;
                if i * i + j * j > limit {
                    *px = src.pixel(x, y);
                    continue;
                }

                samples.clear();
                for &(ox, oy) in &state.offsets {
                    let u = i + ox;
                    let v = j + oy;
                    let radius = u.hypot(v);
                    let t = 1.0 - radius / max_radius;
                    let t = if t < 0.0 { 0.0 } else { t * t * t };
                    let theta = v.atan2(u) + t * twist / 100.0;
                    let (sin, cos) = theta.sin_cos();
                    let sx = (hw + radius * cos).floor() as i32;
                    let sy = (hh + radius * sin).floor() as i32;
                    samples.push(src.pixel_clamped(sx, sy));
                }
                *px = ColorBgra::blend(&samples);
            }
        }
        Ok(())
    }
}
