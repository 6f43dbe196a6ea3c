//! Gaussian blur with triangular integer weights.
//!
//! The weight row for radius `r` has `2r + 1` entries, `16 * (i + 1)`
//! rising to the center and mirrored after it, so radius 1 is `[16, 32, 16]`.
//! The 2D kernel is the outer product of that row with itself.
//!
//! Color channels are weighted by alpha so transparent pixels do not bleed
//! their color into the result; alpha itself is a plain weighted mean.
//! Samples outside the source are skipped.
//!
//! Each output row keeps one vertical sum per window column. Moving one
//! pixel right drops the leftmost column and computes only the new
//! rightmost one, so a row costs `O(width * r)` column work instead of
//! `O(width * r^2)`.

use pfx_core::{ColorBgra, Rect, Surface};
use pfx_render::{
    ensure_same_bounds, Category, Effect, EffectInfo, EffectResult, ParamDef, ParamValues, TileContext,
};
use std::collections::VecDeque;

/// Largest accepted radius.
pub const MAX_RADIUS: i32 = 200;

/// Blur parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaussianBlurToken {
    /// Radius in pixels; 0 copies the source
    pub radius: i32,
}

impl Default for GaussianBlurToken {
    fn default() -> Self {
        Self { radius: 2 }
    }
}

/// Triangular weight row of length `2 * radius + 1`.
pub fn weights(radius: i32) -> Vec<i64> {
    let r = radius.max(0) as i64;
    (0..=2 * r)
        .map(|i| if i <= r { 16 * (i + 1) } else { 16 * (2 * r - i + 1) })
        .collect()
}

/// Gaussian blur effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianBlurEffect;

impl GaussianBlurEffect {
    /// Creates the effect.
    pub fn new() -> Self {
        Self
    }
}

/// Weighted sums of one window column.
#[derive(Debug, Clone, Copy, Default)]
struct Column {
    /// Sum of weights of in-bounds samples
    wa: i64,
    /// Sum of alpha-scaled weights
    wc: i64,
    a: i64,
    b: i64,
    g: i64,
    r: i64,
}

impl Column {
    fn sample(src: &Surface, x: i32, y: i32, weights: &[i64]) -> Self {
        let mut col = Column::default();
        if x < 0 || x >= src.width() {
            return col;
        }
        let r = (weights.len() / 2) as i32;
        for (wy, &w) in weights.iter().enumerate() {
            let sy = y + wy as i32 - r;
            let Some(c) = src.get_pixel(x, sy) else {
                continue;
            };
            let a = c.a as i64;
            col.wa += w;
            col.a += w * a;
            let wp = w * (a + (a >> 7));
            col.wc += wp;
            col.b += wp * c.b as i64;
            col.g += wp * c.g as i64;
            col.r += wp * c.r as i64;
        }
        col
    }
}

fn combine(columns: &VecDeque<Column>, weights: &[i64]) -> ColorBgra {
    let mut total = Column::default();
    for (col, &w) in columns.iter().zip(weights) {
        total.wa += w * col.wa;
        total.wc += w * col.wc;
        total.a += w * col.a;
        total.b += w * col.b;
        total.g += w * col.g;
        total.r += w * col.r;
    }
    if total.wa == 0 || total.wc == 0 {
        return ColorBgra::TRANSPARENT_BLACK;
    }
    ColorBgra::from_bgra(
        (total.b / total.wc) as u8,
        (total.g / total.wc) as u8,
        (total.r / total.wc) as u8,
        (total.a / total.wa) as u8,
    )
}

impl Effect for GaussianBlurEffect {
    type Token = GaussianBlurToken;
    type State = Vec<i64>;

    fn info(&self) -> EffectInfo {
        EffectInfo::new("pfx", "gaussian-blur", "Gaussian Blur", Category::Blurs)
    }

    fn parameters(&self) -> Vec<ParamDef> {
        let d = GaussianBlurToken::default();
        vec![ParamDef::int("radius", "Radius", 0, MAX_RADIUS as i64, d.radius as i64)]
    }

    fn token_from_params(&self, params: &ParamValues) -> EffectResult<GaussianBlurToken> {
        let p = params.resolve(&self.parameters())?;
        Ok(GaussianBlurToken {
            radius: p.int("radius")? as i32,
        })
    }

    fn bind(&self, token: &GaussianBlurToken, src: &Surface, dst_bounds: Rect) -> EffectResult<Vec<i64>> {
        ensure_same_bounds(src, dst_bounds)?;
        Ok(weights(token.radius))
    }

    fn render_tile(&self, weights: &Vec<i64>, ctx: &mut TileContext<'_, GaussianBlurToken>) -> EffectResult<()> {
        let src = ctx.src();
        if weights.len() <= 1 {
            ctx.writer().copy_from(src);
            return Ok(());
        }
        let r = (weights.len() / 2) as i32;
        let mut columns = VecDeque::with_capacity(weights.len());

        for (x0, y, row) in ctx.rows_mut() {
            columns.clear();
            columns.extend((x0 - r..=x0 + r).map(|x| Column::sample(src, x, y, weights)));
            for (i, px) in row.iter_mut().enumerate() {
                *px = combine(&columns, weights);
                columns.pop_front();
                columns.push_back(Column::sample(src, x0 + i as i32 + r + 1, y, weights));
            }
        }
        Ok(())
    }
}
