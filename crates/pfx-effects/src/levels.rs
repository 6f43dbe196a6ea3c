//! Levels: per-channel input range, gamma and output range.
//!
//! The token derives three 256-entry lookup tables on first use and
//! drops them whenever a setting changes. Every worker renders with its
//! own token clone, so each builds its tables once without locking.

use pfx_core::{ColorBgra, Rect, Surface};
use pfx_render::{
    ensure_same_bounds, Category, Effect, EffectInfo, EffectResult, ParamDef, ParamValues, TileContext,
};

/// Blue, green and red lookup tables.
pub type Luts = [[u8; 256]; 3];

/// Levels parameters with cached lookup tables.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelsToken {
    input_low: ColorBgra,
    input_high: ColorBgra,
    output_low: ColorBgra,
    output_high: ColorBgra,
    gamma: [f64; 3],
    luts: Option<Box<Luts>>,
}

impl Default for LevelsToken {
    fn default() -> Self {
        Self {
            input_low: ColorBgra::BLACK,
            input_high: ColorBgra::WHITE,
            output_low: ColorBgra::BLACK,
            output_high: ColorBgra::WHITE,
            gamma: [1.0; 3],
            luts: None,
        }
    }
}

fn bgr(c: ColorBgra) -> [u8; 3] {
    [c.b, c.g, c.r]
}

impl LevelsToken {
    /// Identity levels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Input range mapped onto the output range.
    pub fn with_input(mut self, low: ColorBgra, high: ColorBgra) -> Self {
        self.set_input(low, high);
        self
    }

    /// Output range.
    pub fn with_output(mut self, low: ColorBgra, high: ColorBgra) -> Self {
        self.set_output(low, high);
        self
    }

    /// Same gamma on all channels.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        for channel in 0..3 {
            self.set_gamma(channel, gamma);
        }
        self
    }

    /// Sets the input range.
    pub fn set_input(&mut self, low: ColorBgra, high: ColorBgra) {
        self.input_low = low;
        self.input_high = high;
        self.luts = None;
    }

    /// Sets the output range.
    pub fn set_output(&mut self, low: ColorBgra, high: ColorBgra) {
        self.output_low = low;
        self.output_high = high;
        self.luts = None;
    }

    /// Sets the gamma of channel 0 (blue), 1 (green) or 2 (red).
    /// Other channel indices are ignored.
    pub fn set_gamma(&mut self, channel: usize, gamma: f64) {
        if let Some(g) = self.gamma.get_mut(channel) {
            *g = gamma;
            self.luts = None;
        }
    }

    /// Gamma per channel, blue first.
    pub fn gamma(&self) -> [f64; 3] {
        self.gamma
    }

    /// `true` once lookup tables have been derived and not invalidated.
    pub fn has_luts(&self) -> bool {
        self.luts.is_some()
    }

    /// Lookup tables, derived on first use.
    pub fn luts(&mut self) -> &Luts {
        let input = (bgr(self.input_low), bgr(self.input_high));
        let output = (bgr(self.output_low), bgr(self.output_high));
        let gamma = self.gamma;
        self.luts
            .get_or_insert_with(|| Box::new(build_luts(input, output, gamma)))
    }

    /// Maps one pixel. Alpha is kept.
    pub fn apply(&mut self, c: ColorBgra) -> ColorBgra {
        let [b, g, r] = self.luts();
        ColorBgra::from_bgra(b[c.b as usize], g[c.g as usize], r[c.r as usize], c.a)
    }
}

fn build_luts(input: ([u8; 3], [u8; 3]), output: ([u8; 3], [u8; 3]), gamma: [f64; 3]) -> Luts {
    let mut luts = [[0u8; 256]; 3];
    for (ch, lut) in luts.iter_mut().enumerate() {
        let (il, ih) = (input.0[ch] as f64, input.1[ch] as f64);
        let (ol, oh) = (output.0[ch] as f64, output.1[ch] as f64);
        for (v, entry) in lut.iter_mut().enumerate() {
            let v = v as f64;
            // A collapsed input range becomes a threshold
            let t = if ih > il {
                ((v - il) / (ih - il)).clamp(0.0, 1.0)
            } else if v >= ih {
                1.0
            } else {
                0.0
            };
            let t = t.powf(1.0 / gamma[ch]);
            *entry = (ol + (oh - ol) * t).round().clamp(0.0, 255.0) as u8;
        }
    }
    luts
}

/// Levels effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelsEffect;

impl Effect for LevelsEffect {
    type Token = LevelsToken;
    type State = ();

    fn info(&self) -> EffectInfo {
        EffectInfo::new("pfx", "levels", "Levels", Category::Adjustments)
    }

    fn parameters(&self) -> Vec<ParamDef> {
        vec![
            ParamDef::color("input_low", "Input Low", ColorBgra::BLACK),
            ParamDef::color("input_high", "Input High", ColorBgra::WHITE),
            ParamDef::color("output_low", "Output Low", ColorBgra::BLACK),
            ParamDef::color("output_high", "Output High", ColorBgra::WHITE),
            ParamDef::float("gamma", "Gamma", 0.1, 10.0, 1.0),
        ]
    }

    fn token_from_params(&self, params: &ParamValues) -> EffectResult<LevelsToken> {
        let p = params.resolve(&self.parameters())?;
        Ok(LevelsToken::new()
            .with_input(p.color("input_low")?, p.color("input_high")?)
            .with_output(p.color("output_low")?, p.color("output_high")?)
            .with_gamma(p.float("gamma")?))
    }

    fn bind(&self, _: &LevelsToken, src: &Surface, dst_bounds: Rect) -> EffectResult<()> {
        ensure_same_bounds(src, dst_bounds)
    }

    fn render_tile(&self, _: &(), ctx: &mut TileContext<'_, LevelsToken>) -> EffectResult<()> {
        let src = ctx.src();
        let parts = ctx.parts();
        let token = parts.token;
        for (x0, y, row) in parts.writer.rows_mut() {
            let start = x0 as usize;
            let source = &src.row(y)[start..start + row.len()];
            for (px, s) in row.iter_mut().zip(source) {
                *px = token.apply(*s);
            }
        }
        Ok(())
    }
}
