//! Perlin-noise clouds.
//!
//! Sums up to 12 octaves of [`noise`](crate::perlin::noise), each at half
//! the cell size of the previous one and weighted by `power^i`, clamps
//! the sum to `-1..=1` and maps it onto a gradient between two colors. The
//! result is composited onto the source with a [`BlendMode`].

use crate::perlin::noise;
use pfx_core::{clamp_to_byte, ColorBgra, Rect, Surface};
use pfx_render::{
    ensure_same_bounds, Category, Effect, EffectError, EffectInfo, EffectResult, ParamDef, ParamValues,
    TileContext,
};

const MAX_OCTAVES: i32 = 12;

/// How the generated clouds combine with the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Clouds only; the source is ignored
    Replace,
    /// Clouds composited over the source by their alpha
    #[default]
    Normal,
    /// Source times clouds
    Multiply,
    /// Inverse of the product of the inverses
    Screen,
}

impl BlendMode {
    /// All modes, in parameter order.
    pub const ALL: [BlendMode; 4] = [
        BlendMode::Replace,
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
    ];

    /// Parameter name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlendMode::Replace => "replace",
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
        }
    }

    fn mix(&self, s: u8, c: u8) -> u8 {
        let (s, c) = (s as i64, c as i64);
        let m = match self {
            BlendMode::Replace | BlendMode::Normal => c,
            BlendMode::Multiply => s * c / 255,
            BlendMode::Screen => 255 - (255 - s) * (255 - c) / 255,
        };
        m as u8
    }

    /// Composites cloud color `top` onto `bottom`.
    pub fn apply(&self, bottom: ColorBgra, top: ColorBgra) -> ColorBgra {
        if *self == BlendMode::Replace {
            return top;
        }
        let ta = top.a as i64;
        let ba = bottom.a as i64;
        let out_a = ta * 255 + ba * (255 - ta);
        if out_a == 0 {
            return ColorBgra::TRANSPARENT_BLACK;
        }
        let channel = |b: u8, t: u8| {
            let m = self.mix(b, t) as i64;
            clamp_to_byte((m * ta * 255 + b as i64 * ba * (255 - ta)) / out_a)
        };
        ColorBgra::from_bgra(
            channel(bottom.b, top.b),
            channel(bottom.g, top.g),
            channel(bottom.r, top.r),
            clamp_to_byte(out_a / 255),
        )
    }
}

/// Cloud parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudsToken {
    /// Size of the largest octave's cells, in half-pixels
    pub scale: i32,
    /// Amplitude ratio between successive octaves, 0..=1
    pub power: f64,
    /// Noise field selector
    pub seed: u8,
    /// Color at noise -1
    pub from: ColorBgra,
    /// Color at noise +1
    pub to: ColorBgra,
    /// Compositing mode
    pub blend: BlendMode,
}

impl Default for CloudsToken {
    fn default() -> Self {
        Self {
            scale: 250,
            power: 0.5,
            seed: 0,
            from: ColorBgra::BLACK,
            to: ColorBgra::WHITE,
            blend: BlendMode::Normal,
        }
    }
}

impl CloudsToken {
    /// Clamped octave sum at pixel (x, y) of a `width` x `height` surface.
    pub fn value(&self, x: i32, y: i32, width: i32, height: i32) -> f64 {
        let dx = (2 * x - width) as f64;
        let dy = (2 * y - height) as f64;
        let mut val = 0.0;
        let mut mult = 1.0;
        let mut div = self.scale;
        let mut octave = 0;
        while octave < MAX_OCTAVES && mult > 0.03 && div > 0 {
            let dxr = 65536.0 + dx / div as f64;
            let dyr = 65536.0 + dy / div as f64;
            let ix = dxr.floor();
            let iy = dyr.floor();
            let seed = self.seed ^ octave as u8;
            val += mult * noise(ix as i64 as u8, iy as i64 as u8, dxr - ix, dyr - iy, seed);
            mult *= self.power;
            div /= 2;
            octave += 1;
        }
        val.clamp(-1.0, 1.0)
    }

    /// Gradient color at pixel (x, y), before blending.
    pub fn color(&self, x: i32, y: i32, width: i32, height: i32) -> ColorBgra {
        let t = (self.value(x, y, width, height) + 1.0) / 2.0;
        ColorBgra::lerp(self.from, self.to, t)
    }
}

/// Clouds generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudsEffect;

impl Effect for CloudsEffect {
    type Token = CloudsToken;
    type State = ();

    fn info(&self) -> EffectInfo {
        EffectInfo::new("pfx", "clouds", "Clouds", Category::Render)
    }

    fn parameters(&self) -> Vec<ParamDef> {
        let d = CloudsToken::default();
        let modes: Vec<&str> = BlendMode::ALL.iter().map(|m| m.as_str()).collect();
        vec![
            ParamDef::int("scale", "Scale", 2, 1000, d.scale as i64),
            ParamDef::float("power", "Roughness", 0.0, 1.0, d.power),
            ParamDef::int("seed", "Seed", 0, 255, d.seed as i64),
            ParamDef::color("from", "Primary Color", d.from),
            ParamDef::color("to", "Secondary Color", d.to),
            ParamDef::choice("blend", "Blend Mode", &modes, 1),
        ]
    }

    fn token_from_params(&self, params: &ParamValues) -> EffectResult<CloudsToken> {
        let p = params.resolve(&self.parameters())?;
        let blend = p.choice("blend")?;
        Ok(CloudsToken {
            scale: p.int("scale")? as i32,
            power: p.float("power")?,
            seed: p.int("seed")? as u8,
            from: p.color("from")?,
            to: p.color("to")?,
            blend: *BlendMode::ALL
                .get(blend)
                .ok_or_else(|| EffectError::failed(format!("blend mode {blend} out of range")))?,
        })
    }

    fn bind(&self, _: &CloudsToken, src: &Surface, dst_bounds: Rect) -> EffectResult<()> {
        ensure_same_bounds(src, dst_bounds)
    }

    fn render_tile(&self, _: &(), ctx: &mut TileContext<'_, CloudsToken>) -> EffectResult<()> {
        let token = *ctx.token();
        let src = ctx.src();
        let (w, h) = (src.width(), src.height());

        for (x0, y, row) in ctx.rows_mut() {
            for (i, px) in row.iter_mut().enumerate() {
                let x = x0 + i as i32;
                let cloud = token.color(x, y, w, h);
                *px = token.blend.apply(src.pixel(x, y), cloud);
            }
        }
        Ok(())
    }
}
