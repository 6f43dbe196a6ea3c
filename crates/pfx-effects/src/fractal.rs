//! Escape-time fractals: Mandelbrot and Julia.
//!
//! Both effects share one supersampling loop. Each output pixel takes
//! `quality^2 + 1` samples spread over the pixel, maps them to the complex
//! plane (centered, rotated by `angle`, scaled by `1 / zoom`) and averages
//! a color ramp driven by the smoothed iteration count.

use crate::sample::{check_quality, MAX_QUALITY, MIN_QUALITY};
use pfx_core::{clamp_to_byte_f64, ColorBgra, Rect, Surface};
use pfx_render::{
    ensure_same_bounds, Category, Effect, EffectInfo, EffectResult, ParamDef, ParamValues, TileContext,
};

const MANDELBROT_MAX: f64 = 100_000.0;
const MANDELBROT_OFFSET: (f64, f64) = (-0.7, -0.29);
const JULIA_MAX: f64 = 10_000.0;
const JULIA_C: (f64, f64) = (0.3125, 0.03);

/// Shared fractal parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractalToken {
    /// Color ramp multiplier, 1..=10
    pub factor: i64,
    /// Supersampling quality, 1..=5
    pub quality: i64,
    /// Magnification, 0..=50
    pub zoom: f64,
    /// Rotation in degrees
    pub angle: f64,
    /// Invert color channels afterwards (Mandelbrot only)
    pub invert: bool,
}

/// Per-run sampling constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampler {
    width: f64,
    height: f64,
    inv_height: f64,
    inv_zoom: f64,
    inv_quality: f64,
    count: u32,
    inv_count: f64,
    angle: f64,
}

impl Sampler {
    /// Constants for a `width` x `height` surface.
    ///
    /// # Errors
    ///
    /// [`pfx_render::EffectError::InvalidParameter`] if `quality` is outside 1..=5.
    pub fn new(token: &FractalToken, width: i32, height: i32) -> EffectResult<Self> {
        check_quality(token.quality)?;
        let count = (token.quality * token.quality + 1) as u32;
        Ok(Self {
            width: width as f64,
            height: height as f64,
            inv_height: 1.0 / height as f64,
            inv_zoom: 1.0 / token.zoom,
            inv_quality: 1.0 / token.quality as f64,
            count,
            inv_count: 1.0 / count as f64,
            angle: token.angle.to_radians(),
        })
    }

    /// Averages `ramp` over the samples of pixel (x, y). `ramp` gets the
    /// complex coordinate of a sample and returns summable BGRA channels.
    fn pixel(&self, x: i32, y: i32, ramp: impl Fn(f64, f64) -> [u8; 4]) -> ColorBgra {
        let mut sums = [0u32; 4];
        for i in 0..self.count {
            let i = i as f64;
            let u = (2.0 * x as f64 - self.width + i * self.inv_count) * self.inv_height;
            let v = (2.0 * y as f64 - self.height + (i * self.inv_quality) % 1.0) * self.inv_height;
            let radius = u.hypot(v);
            let theta = v.atan2(u) + self.angle;
            let (sin, cos) = theta.sin_cos();
            let channels = ramp(radius * cos * self.inv_zoom, radius * sin * self.inv_zoom);
            for (sum, c) in sums.iter_mut().zip(channels) {
                *sum += c as u32;
            }
        }
        let [b, g, r, a] = sums.map(|s| (s / self.count) as u8);
        ColorBgra::from_bgra(b, g, r, a)
    }
}

/// Smoothed Mandelbrot escape count of `c = r + i*im`.
pub fn mandelbrot(r: f64, im: f64, factor: i64) -> f64 {
    let mut c = 0i64;
    let (mut x, mut y) = (0.0f64, 0.0f64);
    while c * factor < 1024 && x * x + y * y < MANDELBROT_MAX {
        let t = x;
        x = x * x - y * y + r;
        y = 2.0 * t * y + im;
        c += 1;
    }
    c as f64 - (x * x + y * y).ln() / MANDELBROT_MAX.ln()
}

/// Smoothed escape count of `z = x + i*y` under `z^2 + (cr + i*ci)`.
pub fn julia(mut x: f64, mut y: f64, cr: f64, ci: f64) -> f64 {
    let mut c = 0.0;
    while c < 256.0 && x * x + y * y < JULIA_MAX {
        let t = x;
        x = x * x - y * y + cr;
        y = 2.0 * t * y + ci;
        c += 1.0;
    }
    c - (2.0 - 2.0 * JULIA_MAX.ln() / (x * x + y * y).ln())
}

/// Mandelbrot set renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MandelbrotEffect;

impl MandelbrotEffect {
    /// Default parameters.
    pub fn default_token() -> FractalToken {
        FractalToken {
            factor: 1,
            quality: 2,
            zoom: 10.0,
            angle: 0.0,
            invert: false,
        }
    }
}

impl Effect for MandelbrotEffect {
    type Token = FractalToken;
    type State = Sampler;

    fn info(&self) -> EffectInfo {
        EffectInfo::new("pfx", "mandelbrot", "Mandelbrot Fractal", Category::Render)
    }

    fn parameters(&self) -> Vec<ParamDef> {
        let d = Self::default_token();
        vec![
            ParamDef::int("factor", "Factor", 1, 10, d.factor),
            ParamDef::int("quality", "Quality", MIN_QUALITY, MAX_QUALITY, d.quality),
            ParamDef::float("zoom", "Zoom", 0.0, 50.0, d.zoom),
            ParamDef::float("angle", "Angle", -180.0, 180.0, d.angle),
            ParamDef::bool("invert", "Invert Colors", d.invert),
        ]
    }

    fn token_from_params(&self, params: &ParamValues) -> EffectResult<FractalToken> {
        let p = params.resolve(&self.parameters())?;
        Ok(FractalToken {
            factor: p.int("factor")?,
            quality: p.int("quality")?,
            zoom: p.float("zoom")?,
            angle: p.float("angle")?,
            invert: p.bool("invert")?,
        })
    }

    fn bind(&self, token: &FractalToken, src: &Surface, dst_bounds: Rect) -> EffectResult<Sampler> {
        ensure_same_bounds(src, dst_bounds)?;
        Sampler::new(token, dst_bounds.width, dst_bounds.height)
    }

    fn render_tile(&self, sampler: &Sampler, ctx: &mut TileContext<'_, FractalToken>) -> EffectResult<()> {
        let FractalToken { factor, invert, .. } = *ctx.token();
        let ramp = |u: f64, v: f64| {
            let m = mandelbrot(u + MANDELBROT_OFFSET.0, v + MANDELBROT_OFFSET.1, factor);
            let c = 64.0 + factor as f64 * m;
            [
                clamp_to_byte_f64(c - 256.0),
                clamp_to_byte_f64(c - 512.0),
                clamp_to_byte_f64(c - 768.0),
                clamp_to_byte_f64(c),
            ]
        };

        for (x0, y, row) in ctx.rows_mut() {
            for (i, px) in row.iter_mut().enumerate() {
                let c = sampler.pixel(x0 + i as i32, y, &ramp);
                *px = if invert {
                    ColorBgra::from_bgra(255 - c.b, 255 - c.g, 255 - c.r, c.a)
                } else {
                    c
                };
            }
        }
        Ok(())
    }
}

/// Julia set renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JuliaEffect;

impl JuliaEffect {
    /// Default parameters.
    pub fn default_token() -> FractalToken {
        FractalToken {
            factor: 4,
            quality: 2,
            zoom: 1.0,
            angle: 0.0,
            invert: false,
        }
    }
}

impl Effect for JuliaEffect {
    type Token = FractalToken;
    type State = Sampler;

    fn info(&self) -> EffectInfo {
        EffectInfo::new("pfx", "julia", "Julia Fractal", Category::Render)
    }

    fn parameters(&self) -> Vec<ParamDef> {
        let d = Self::default_token();
        vec![
            ParamDef::int("factor", "Factor", 1, 10, d.factor),
            ParamDef::int("quality", "Quality", MIN_QUALITY, MAX_QUALITY, d.quality),
            ParamDef::float("zoom", "Zoom", 0.0, 50.0, d.zoom),
            ParamDef::float("angle", "Angle", -180.0, 180.0, d.angle),
        ]
    }

    fn token_from_params(&self, params: &ParamValues) -> EffectResult<FractalToken> {
        let p = params.resolve(&self.parameters())?;
        Ok(FractalToken {
            factor: p.int("factor")?,
            quality: p.int("quality")?,
            zoom: p.float("zoom")?,
            angle: p.float("angle")?,
            invert: false,
        })
    }

    fn bind(&self, token: &FractalToken, src: &Surface, dst_bounds: Rect) -> EffectResult<Sampler> {
        ensure_same_bounds(src, dst_bounds)?;
        Sampler::new(token, dst_bounds.width, dst_bounds.height)
    }

    fn render_tile(&self, sampler: &Sampler, ctx: &mut TileContext<'_, FractalToken>) -> EffectResult<()> {
        let factor = ctx.token().factor as f64;
        let ramp = |u: f64, v: f64| {
            let c = factor * julia(u, v, JULIA_C.0, JULIA_C.1);
            [
                clamp_to_byte_f64(c - 768.0),
                clamp_to_byte_f64(c - 512.0),
                clamp_to_byte_f64(c - 256.0),
                clamp_to_byte_f64(c),
            ]
        };

        for (x0, y, row) in ctx.rows_mut() {
            for (i, px) in row.iter_mut().enumerate() {
                *px = sampler.pixel(x0 + i as i32, y, &ramp);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pfx_render::{render_serial, EffectError, ParamValue};

    fn render<E: Effect<Token = FractalToken>>(effect: &E, token: FractalToken, tiles: &[Vec<Rect>]) -> Surface {
        let src = Surface::new(32, 24).unwrap();
        let mut dst = Surface::new(32, 24).unwrap();
        render_serial(effect, &token, &src, &mut dst, tiles, 0).unwrap();
        dst
    }

    #[test]
    fn escape_counts() {
        // Inside the main cardioid: runs to the iteration cap
        assert!(mandelbrot(-0.1, 0.1, 1) >= 1024.0);
        assert!(mandelbrot(-0.1, 0.1, 4) >= 256.0);
        // Escapes after four iterations
        let outside = mandelbrot(2.0, 2.0, 1);
        assert!(outside > 2.0 && outside < 4.0, "{outside}");

        let j = julia(10.0, 10.0, JULIA_C.0, JULIA_C.1);
        assert!(j > 0.0 && j < 1.0, "{j}");
    }

    #[test]
    fn sample_count_and_angle() {
        let token = MandelbrotEffect::default_token();
        let s = Sampler::new(&FractalToken { angle: 90.0, ..token }, 10, 20).unwrap();
        assert_eq!(s.count, 5);
        assert_relative_eq!(s.angle, std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(s.inv_zoom, 0.1);
    }

    #[test]
    fn quality_outside_range_is_rejected() {
        let token = JuliaEffect::default_token();
        for quality in [0, -1, 6] {
            let bad = FractalToken { quality, ..token };
            assert!(matches!(
                Sampler::new(&bad, 10, 20),
                Err(EffectError::InvalidParameter { .. })
            ));
            let src = Surface::new(10, 20).unwrap();
            assert!(JuliaEffect.bind(&bad, &src, src.bounds()).is_err());
            assert!(MandelbrotEffect.bind(&bad, &src, src.bounds()).is_err());
        }
    }

    #[test]
    fn invert_flips_color_only() {
        let token = MandelbrotEffect::default_token();
        let tiles = [vec![Rect::from_size(32, 24)]];
        let plain = render(&MandelbrotEffect, token, &tiles);
        let inverted = render(&MandelbrotEffect, FractalToken { invert: true, ..token }, &tiles);
        for (p, q) in plain.pixels().iter().zip(inverted.pixels()) {
            assert_eq!((255 - p.b, 255 - p.g, 255 - p.r, p.a), (q.b, q.g, q.r, q.a));
        }
    }

    #[test]
    fn tiles_match_whole_render() {
        let token = JuliaEffect::default_token();
        let whole = render(&JuliaEffect, token, &[vec![Rect::from_size(32, 24)]]);
        let tiles = vec![
            vec![Rect::new(0, 0, 32, 1)],
            vec![Rect::new(0, 1, 32, 11), Rect::new(0, 20, 32, 4)],
            vec![Rect::new(0, 12, 32, 8)],
        ];
        assert_eq!(render(&JuliaEffect, token, &tiles), whole);
        assert!(whole.pixels().iter().any(|p| *p != whole.pixel(0, 0)));
    }

    #[test]
    fn params_and_defaults() {
        let token = JuliaEffect.token_from_params(&ParamValues::new()).unwrap();
        assert_eq!(token, JuliaEffect::default_token());
        let p = ParamValues::new().with("invert", ParamValue::Bool(true));
        assert!(MandelbrotEffect.token_from_params(&p).unwrap().invert);
        assert!(JuliaEffect.token_from_params(&p).is_err());
    }
}
