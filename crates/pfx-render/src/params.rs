//! Effect parameter model.
//!
//! An effect describes its user-tunable values as a list of [`ParamDef`]s.
//! Front-ends collect [`ParamValues`] (from a CLI, a config file or a UI),
//! and the effect turns the validated values into its typed token in
//! [`Effect::token_from_params`](crate::Effect::token_from_params).
//!
//! # Usage
//!
//! ```rust
//! use pfx_render::{ParamDef, ParamValue, ParamValues};
//!
//! let defs = vec![
//!     ParamDef::int("radius", "Radius", 0, 200, 2),
//!     ParamDef::bool("invert", "Invert colors", false),
//! ];
//!
//! let mut values = ParamValues::new();
//! values.push_assignment("radius=7", &defs).unwrap();
//!
//! let resolved = values.resolve(&defs).unwrap();
//! assert_eq!(resolved.int("radius").unwrap(), 7);
//! assert!(!resolved.bool("invert").unwrap());
//! ```

use crate::error::{EffectError, EffectResult};
use pfx_core::ColorBgra;
use std::fmt;

/// The shape and valid range of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// Integer in `min..=max`.
    Int {
        /// Lower bound
        min: i64,
        /// Upper bound
        max: i64,
    },
    /// Float in `min..=max`.
    Float {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
    /// On/off switch.
    Bool,
    /// BGRA color.
    Color,
    /// One of a fixed list of named options.
    Choice {
        /// Option names, in index order
        options: Vec<String>,
    },
    /// 2D point; both coordinates in `min..=max`.
    Point {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int { min, max } => write!(f, "int [{min}, {max}]"),
            Self::Float { min, max } => write!(f, "float [{min}, {max}]"),
            Self::Bool => f.write_str("bool"),
            Self::Color => f.write_str("color"),
            Self::Choice { options } => write!(f, "one of {}", options.join("|")),
            Self::Point { min, max } => write!(f, "point [{min}, {max}]"),
        }
    }
}

/// A parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Color
    Color(ColorBgra),
    /// Index into a choice list
    Choice(usize),
    /// 2D point
    Point(f64, f64),
}

impl ParamValue {
    /// Integer value, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value; integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Boolean value, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Color value, if this is a `Color`.
    pub fn as_color(&self) -> Option<ColorBgra> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Choice index, if this is a `Choice`.
    pub fn as_choice(&self) -> Option<usize> {
        match self {
            Self::Choice(i) => Some(*i),
            _ => None,
        }
    }

    /// Point value, if this is a `Point`.
    pub fn as_point(&self) -> Option<(f64, f64)> {
        match self {
            Self::Point(x, y) => Some((*x, *y)),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Color(c) => write!(f, "{c}"),
            Self::Choice(i) => write!(f, "#{i}"),
            Self::Point(x, y) => write!(f, "{x},{y}"),
        }
    }
}

/// Declaration of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    /// Machine name, used in `name=value` assignments
    pub name: String,
    /// Human-readable label
    pub display_name: String,
    /// Shape and range
    pub kind: ParamKind,
    /// Value used when none is supplied
    pub default: ParamValue,
}

impl ParamDef {
    /// Integer parameter.
    pub fn int(name: &str, display_name: &str, min: i64, max: i64, default: i64) -> Self {
        Self::new(name, display_name, ParamKind::Int { min, max }, ParamValue::Int(default))
    }

    /// Float parameter.
    pub fn float(name: &str, display_name: &str, min: f64, max: f64, default: f64) -> Self {
        Self::new(name, display_name, ParamKind::Float { min, max }, ParamValue::Float(default))
    }

    /// Boolean parameter.
    pub fn bool(name: &str, display_name: &str, default: bool) -> Self {
        Self::new(name, display_name, ParamKind::Bool, ParamValue::Bool(default))
    }

    /// Color parameter.
    pub fn color(name: &str, display_name: &str, default: ColorBgra) -> Self {
        Self::new(name, display_name, ParamKind::Color, ParamValue::Color(default))
    }

    /// Choice parameter; `default` indexes `options`.
    pub fn choice(name: &str, display_name: &str, options: &[&str], default: usize) -> Self {
        Self::new(
            name,
            display_name,
            ParamKind::Choice {
                options: options.iter().map(|o| o.to_string()).collect(),
            },
            ParamValue::Choice(default),
        )
    }

    /// Point parameter.
    pub fn point(name: &str, display_name: &str, min: f64, max: f64, default: (f64, f64)) -> Self {
        Self::new(
            name,
            display_name,
            ParamKind::Point { min, max },
            ParamValue::Point(default.0, default.1),
        )
    }

    fn new(name: &str, display_name: &str, kind: ParamKind, default: ParamValue) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            kind,
            default,
        }
    }

    /// Checks a value against this definition.
    ///
    /// Integers are accepted for float parameters.
    pub fn validate(&self, value: &ParamValue) -> EffectResult<()> {
        match (&self.kind, value) {
            (ParamKind::Int { min, max }, ParamValue::Int(v)) => self.check_range(*v, *min, *max),
            (ParamKind::Float { min, max }, ParamValue::Float(_) | ParamValue::Int(_)) => {
                let v = value.as_float().unwrap_or(f64::NAN);
                if v.is_nan() {
                    return Err(self.mismatch(value));
                }
                self.check_range(v, *min, *max)
            }
            (ParamKind::Bool, ParamValue::Bool(_)) => Ok(()),
            (ParamKind::Color, ParamValue::Color(_)) => Ok(()),
            (ParamKind::Choice { options }, ParamValue::Choice(i)) => {
                self.check_range(*i, 0, options.len().saturating_sub(1))
            }
            (ParamKind::Point { min, max }, ParamValue::Point(x, y)) => {
                self.check_range(*x, *min, *max)?;
                self.check_range(*y, *min, *max)
            }
            _ => Err(self.mismatch(value)),
        }
    }

    /// Parses the textual form of a value for this parameter.
    ///
    /// Accepted forms: integers and floats as usual, `true/false/on/off/yes/no/1/0`
    /// for booleans, `RRGGBB[AA]` for colors, an option name or index for
    /// choices, `x,y` for points. The result is validated.
    pub fn parse_value(&self, text: &str) -> EffectResult<ParamValue> {
        let text = text.trim();
        let value = match &self.kind {
            ParamKind::Int { .. } => text.parse::<i64>().ok().map(ParamValue::Int),
            ParamKind::Float { .. } => text.parse::<f64>().ok().map(ParamValue::Float),
            ParamKind::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Some(ParamValue::Bool(true)),
                "false" | "off" | "no" | "0" => Some(ParamValue::Bool(false)),
                _ => None,
            },
            ParamKind::Color => text.parse::<ColorBgra>().ok().map(ParamValue::Color),
            ParamKind::Choice { options } => options
                .iter()
                .position(|o| o.eq_ignore_ascii_case(text))
                .or_else(|| text.parse::<usize>().ok())
                .map(ParamValue::Choice),
            ParamKind::Point { .. } => text.split_once(',').and_then(|(x, y)| {
                let x = x.trim().parse::<f64>().ok()?;
                let y = y.trim().parse::<f64>().ok()?;
                Some(ParamValue::Point(x, y))
            }),
        };
        let value = value.ok_or_else(|| EffectError::ParameterType {
            name: self.name.clone(),
            expected: self.kind.to_string(),
            got: format!("'{text}'"),
        })?;
        self.validate(&value)?;
        Ok(value)
    }

    fn check_range<T: PartialOrd + fmt::Display>(&self, v: T, min: T, max: T) -> EffectResult<()> {
        if v < min || v > max {
            return Err(EffectError::InvalidParameter {
                name: self.name.clone(),
                value: v.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(())
    }

    fn mismatch(&self, value: &ParamValue) -> EffectError {
        EffectError::ParameterType {
            name: self.name.clone(),
            expected: self.kind.to_string(),
            got: format!("{value:?}"),
        }
    }
}

/// Ordered `name → value` list.
///
/// Later assignments to the same name replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamValues {
    values: Vec<(String, ParamValue)>,
}

impl ParamValues {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: &str, value: ParamValue) -> Self {
        self.set(name, value);
        self
    }

    /// Sets or replaces a value.
    pub fn set(&mut self, name: &str, value: ParamValue) {
        match self.values.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.values.push((name.to_string(), value)),
        }
    }

    /// Raw lookup without defaults.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no values are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Checks every value against `defs`.
    pub fn validate(&self, defs: &[ParamDef]) -> EffectResult<()> {
        for (name, value) in &self.values {
            find_def(defs, name)?.validate(value)?;
        }
        Ok(())
    }

    /// Validates and fills in defaults for every declared parameter.
    ///
    /// The result contains exactly the parameters of `defs`, in their
    /// declared order.
    pub fn resolve(&self, defs: &[ParamDef]) -> EffectResult<ParamValues> {
        self.validate(defs)?;
        let values = defs
            .iter()
            .map(|d| (d.name.clone(), self.get(&d.name).copied().unwrap_or(d.default)))
            .collect();
        Ok(ParamValues { values })
    }

    /// Parses `name=value` against `defs` and stores the result.
    pub fn push_assignment(&mut self, text: &str, defs: &[ParamDef]) -> EffectResult<()> {
        let (name, value) = parse_assignment(text, defs)?;
        self.set(&name, value);
        Ok(())
    }

    fn require(&self, name: &str) -> EffectResult<&ParamValue> {
        self.get(name).ok_or_else(|| EffectError::UnknownParameter { name: name.to_string() })
    }

    fn typed<T>(&self, name: &str, expected: &str, f: impl Fn(&ParamValue) -> Option<T>) -> EffectResult<T> {
        let value = self.require(name)?;
        f(value).ok_or_else(|| EffectError::ParameterType {
            name: name.to_string(),
            expected: expected.to_string(),
            got: format!("{value:?}"),
        })
    }

    /// Integer value of `name`.
    pub fn int(&self, name: &str) -> EffectResult<i64> {
        self.typed(name, "int", ParamValue::as_int)
    }

    /// Float value of `name`; integers are widened.
    pub fn float(&self, name: &str) -> EffectResult<f64> {
        self.typed(name, "float", ParamValue::as_float)
    }

    /// Boolean value of `name`.
    pub fn bool(&self, name: &str) -> EffectResult<bool> {
        self.typed(name, "bool", ParamValue::as_bool)
    }

    /// Color value of `name`.
    pub fn color(&self, name: &str) -> EffectResult<ColorBgra> {
        self.typed(name, "color", ParamValue::as_color)
    }

    /// Choice index of `name`.
    pub fn choice(&self, name: &str) -> EffectResult<usize> {
        self.typed(name, "choice", ParamValue::as_choice)
    }

    /// Point value of `name`.
    pub fn point(&self, name: &str) -> EffectResult<(f64, f64)> {
        self.typed(name, "point", ParamValue::as_point)
    }
}

impl FromIterator<(String, ParamValue)> for ParamValues {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        let mut values = ParamValues::new();
        for (name, value) in iter {
            values.set(&name, value);
        }
        values
    }
}

/// Parses a `name=value` assignment against `defs`.
///
/// # Errors
///
/// - [`EffectError::ParameterType`] if there is no `=` or the value does not parse
/// - [`EffectError::UnknownParameter`] if `name` is not declared
/// - [`EffectError::InvalidParameter`] if the value is out of range
pub fn parse_assignment(text: &str, defs: &[ParamDef]) -> EffectResult<(String, ParamValue)> {
    let Some((name, value)) = text.split_once('=') else {
        return Err(EffectError::ParameterType {
            name: text.trim().to_string(),
            expected: "name=value".to_string(),
            got: format!("'{text}'"),
        });
    };
    let def = find_def(defs, name.trim())?;
    Ok((def.name.clone(), def.parse_value(value)?))
}

fn find_def<'a>(defs: &'a [ParamDef], name: &str) -> EffectResult<&'a ParamDef> {
    defs.iter()
        .find(|d| d.name == name)
        .ok_or_else(|| EffectError::UnknownParameter { name: name.to_string() })
}
