//! Gaussian-distributed color noise.
//!
//! Noise samples come from a process-wide lookup table that maps a uniform
//! index to a normally distributed offset. The table is the inverse of the
//! cumulative sum of a scaled normal curve, with the scale found by
//! bisection so the curve sums to the table size. Random numbers come from
//! the tile's own stream, so the output depends only on the run seed.

use pfx_core::{clamp_to_byte, ColorBgra, Rect, Surface};
use pfx_render::{
    ensure_same_bounds, Category, Effect, EffectInfo, EffectResult, ParamDef, ParamValues, TileContext,
};
use rand::Rng;
use std::sync::OnceLock;
use tracing::debug;

/// Entries in the noise lookup table.
pub const TABLE_SIZE: usize = 16384;

fn normal_curve(x: f64, scale: f64) -> f64 {
    scale * (-x * x / 2.0).exp()
}

fn curve_at(i: usize, scale: f64) -> f64 {
    let half = (TABLE_SIZE / 2) as f64;
    normal_curve(16.0 * (i as f64 - half) / TABLE_SIZE as f64, scale)
}

fn build_lookup() -> Vec<i32> {
    let target = TABLE_SIZE as f64;
    let (mut lo, mut hi) = (5.0f64, 10.0f64);
    let mut scale = (lo + hi) * 0.5;
    while hi - lo > 1e-7 {
        scale = (lo + hi) * 0.5;
        let sum: f64 = (0..TABLE_SIZE).map(|i| curve_at(i, scale)).sum();
        if sum > target {
            hi = scale;
        } else if sum < target {
            lo = scale;
        } else {
            break;
        }
    }
    debug!(scale, "noise lookup scale");

    let mut lookup = vec![0i32; TABLE_SIZE];
    let mut sum = 0.0;
    let mut rounded = 0usize;
    for i in 0..TABLE_SIZE {
        sum += curve_at(i, scale);
        let last = rounded;
        rounded = (sum as usize).min(TABLE_SIZE);
        let value = ((i as i64 - (TABLE_SIZE / 2) as i64) * 65536 / TABLE_SIZE as i64) as i32;
        lookup[last..rounded].fill(value);
    }
    lookup
}

/// Shared noise lookup table, built on first use.
///
/// Entries are non-decreasing offsets in `-32768..32768`, distributed
/// like a normal curve around zero.
pub fn noise_lookup() -> &'static [i32] {
    static LOOKUP: OnceLock<Vec<i32>> = OnceLock::new();
    LOOKUP.get_or_init(build_lookup)
}

/// Noise parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddNoiseToken {
    /// Noise strength, 0..=100
    pub intensity: i64,
    /// Color saturation of the noise in percent, 0..=400
    pub saturation: i64,
    /// Percentage of pixels that receive noise, 0..=100
    pub coverage: i64,
}

impl Default for AddNoiseToken {
    fn default() -> Self {
        Self {
            intensity: 64,
            saturation: 100,
            coverage: 100,
        }
    }
}

/// Add-noise effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddNoiseEffect;

/// Fixed-point factors of one run.
#[derive(Debug, Clone, Copy)]
pub struct NoiseState {
    dev: i64,
    sat: i64,
    coverage: i64,
    lookup: &'static [i32],
}

impl Effect for AddNoiseEffect {
    type Token = AddNoiseToken;
    type State = NoiseState;

    fn info(&self) -> EffectInfo {
        EffectInfo::new("pfx", "add-noise", "Add Noise", Category::Noise)
    }

    fn parameters(&self) -> Vec<ParamDef> {
        let d = AddNoiseToken::default();
        vec![
            ParamDef::int("intensity", "Intensity", 0, 100, d.intensity),
            ParamDef::int("saturation", "Color Saturation", 0, 400, d.saturation),
            ParamDef::int("coverage", "Coverage", 0, 100, d.coverage),
        ]
    }

    fn token_from_params(&self, params: &ParamValues) -> EffectResult<AddNoiseToken> {
        let p = params.resolve(&self.parameters())?;
        Ok(AddNoiseToken {
            intensity: p.int("intensity")?,
            saturation: p.int("saturation")?,
            coverage: p.int("coverage")?,
        })
    }

    fn bind(&self, token: &AddNoiseToken, src: &Surface, dst_bounds: Rect) -> EffectResult<NoiseState> {
        ensure_same_bounds(src, dst_bounds)?;
        Ok(NoiseState {
            dev: token.intensity * token.intensity / 4,
            sat: token.saturation * 4096 / 100,
            coverage: token.coverage,
            lookup: noise_lookup(),
        })
    }

    fn render_tile(&self, state: &NoiseState, ctx: &mut TileContext<'_, AddNoiseToken>) -> EffectResult<()> {
        let src = ctx.src();
        let parts = ctx.parts();
        let rng = parts.rng;
        let NoiseState { dev, sat, coverage, lookup } = *state;

        for (x0, y, row) in parts.writer.rows_mut() {
            for (i, px) in row.iter_mut().enumerate() {
                let s = src.pixel(x0 + i as i32, y);
                if rng.gen_range(0..100) >= coverage {
                    *px = s;
                    continue;
                }
                let mut r = lookup[rng.gen_range(0..TABLE_SIZE)] as i64;
                let mut g = lookup[rng.gen_range(0..TABLE_SIZE)] as i64;
                let mut b = lookup[rng.gen_range(0..TABLE_SIZE)] as i64;
                let luma = (4899 * r + 9618 * g + 1867 * b) >> 14;
                r = luma + (((r - luma) * sat) >> 12);
                g = luma + (((g - luma) * sat) >> 12);
                b = luma + (((b - luma) * sat) >> 12);

                let add = |c: u8, n: i64| clamp_to_byte(c as i64 + ((n * dev + 32768) >> 16));
                *px = ColorBgra::from_bgra(add(s.b, b), add(s.g, g), add(s.r, r), s.a);
            }
        }
        Ok(())
    }
}
