//! The effect contract.
//!
//! # Overview
//!
//! An [`Effect`] is a stateless description of a pixel transform:
//!
//! ```text
//!  ParamValues ──token_from_params──► Token ──bind(src, bounds)──► State
//!                                       │                            │
//!                                 (one clone per worker)             │
//!                                       ▼                            ▼
//!                               render_tile(&State, &mut TileContext<Token>)
//! ```
//!
//! - The **token** is the per-run parameter snapshot. The renderer clones it
//!   once per worker, so a token may keep lazily derived data (lookup
//!   tables) without synchronization.
//! - The **state** is whatever `bind` precomputes from the token and the
//!   source surface. It is immutable and shared by all workers of a run;
//!   nothing derived per run is stored on the effect value itself.
//! - `render_tile` writes only through the tile's
//!   [`TileWriter`](crate::TileWriter), which covers exactly the tile's
//!   rectangles. It may read anywhere in the source.
//!
//! Binding once before any tile is enforced by
//! [`BoundEffect`](crate::BoundEffect): it is the only caller of
//! `render_tile` inside this crate.
//!
//! # Example
//!
//! ```rust
//! use pfx_core::{ColorBgra, Rect, Surface};
//! use pfx_render::{
//!     Category, Effect, EffectInfo, EffectResult, ParamValues, TileContext,
//! };
//!
//! struct Invert;
//!
//! impl Effect for Invert {
//!     type Token = ();
//!     type State = ();
//!
//!     fn info(&self) -> EffectInfo {
//!         EffectInfo::new("demo", "invert", "Invert Colors", Category::Adjustments)
//!     }
//!
//!     fn token_from_params(&self, _: &ParamValues) -> EffectResult<()> {
//!         Ok(())
//!     }
//!
//!     fn bind(&self, _: &(), _: &Surface, _: Rect) -> EffectResult<()> {
//!         Ok(())
//!     }
//!
//!     fn render_tile(&self, _: &(), ctx: &mut TileContext<'_, ()>) -> EffectResult<()> {
//!         let src = ctx.src();
//!         for (x, y, row) in ctx.rows_mut() {
//!             for (i, px) in row.iter_mut().enumerate() {
//!                 let s = src.pixel(x + i as i32, y);
//!                 *px = ColorBgra::from_bgra(255 - s.b, 255 - s.g, 255 - s.r, s.a);
//!             }
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use crate::context::TileContext;
use crate::error::{EffectError, EffectResult};
use crate::params::{ParamDef, ParamValues};
use pfx_core::{Rect, Surface};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// A pixel transform usable by the tiled renderer.
pub trait Effect: Send + Sync + 'static {
    /// Per-run parameter snapshot; cloned once per worker.
    type Token: Clone + Send + Sync + fmt::Debug + 'static;
    /// Immutable data precomputed by [`bind`](Effect::bind).
    type State: Send + Sync + 'static;

    /// Identity and scheduling flags.
    fn info(&self) -> EffectInfo;

    /// Parameter declarations, in display order.
    fn parameters(&self) -> Vec<ParamDef> {
        Vec::new()
    }

    /// Builds a token from user values. Missing values take their defaults.
    fn token_from_params(&self, params: &ParamValues) -> EffectResult<Self::Token>;

    /// Prepares per-run state. Called exactly once per run, before any tile.
    fn bind(&self, token: &Self::Token, src: &Surface, dst_bounds: Rect) -> EffectResult<Self::State>;

    /// Renders one tile.
    fn render_tile(&self, state: &Self::State, ctx: &mut TileContext<'_, Self::Token>) -> EffectResult<()>;
}

/// Menu grouping of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Color adjustments
    Adjustments,
    /// Blurs
    Blurs,
    /// Geometric warps
    Distort,
    /// Noise
    Noise,
    /// Generators that ignore the source
    Render,
}

impl Category {
    /// All categories, in menu order.
    pub const ALL: [Category; 5] = [
        Category::Adjustments,
        Category::Blurs,
        Category::Distort,
        Category::Noise,
        Category::Render,
    ];

    /// Lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adjustments => "adjustments",
            Self::Blurs => "blurs",
            Self::Distort => "distort",
            Self::Noise => "noise",
            Self::Render => "render",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// Scheduling and discovery flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EffectFlags(u32);

impl EffectFlags {
    /// No flags.
    pub const NONE: EffectFlags = EffectFlags(0);
    /// Must render on one worker.
    pub const SINGLE_THREADED: EffectFlags = EffectFlags(1);
    /// Superseded; hidden from registries.
    pub const DEPRECATED: EffectFlags = EffectFlags(1 << 1);
    /// Template only; never registered.
    pub const ABSTRACT: EffectFlags = EffectFlags(1 << 2);

    const NAMES: [(EffectFlags, &'static str); 3] = [
        (Self::SINGLE_THREADED, "SINGLE_THREADED"),
        (Self::DEPRECATED, "DEPRECATED"),
        (Self::ABSTRACT, "ABSTRACT"),
    ];

    /// Returns `true` if every flag of `other` is set.
    #[inline]
    pub const fn contains(self, other: EffectFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no flag is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for EffectFlags {
    type Output = EffectFlags;

    fn bitor(self, rhs: EffectFlags) -> EffectFlags {
        EffectFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for EffectFlags {
    fn bitor_assign(&mut self, rhs: EffectFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for EffectFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join(" | "))
    }
}

/// Semantic version of an effect, compared field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    /// Major
    pub major: u32,
    /// Minor
    pub minor: u32,
    /// Patch
    pub patch: u32,
}

impl Version {
    /// Creates a version.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = String;

    /// Parses `MAJOR[.MINOR[.PATCH]]`; missing parts are zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = [0u32; 3];
        let mut count = 0;
        for (i, part) in s.trim().split('.').enumerate() {
            if i >= 3 {
                return Err(format!("invalid version '{s}': too many components"));
            }
            parts[i] = part
                .parse()
                .map_err(|_| format!("invalid version '{s}': '{part}' is not a number"))?;
            count += 1;
        }
        if count == 0 {
            return Err(format!("invalid version '{s}'"));
        }
        Ok(Version::new(parts[0], parts[1], parts[2]))
    }
}

impl TryFrom<String> for Version {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Version> for String {
    fn from(v: Version) -> String {
        v.to_string()
    }
}

/// Identity of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectInfo {
    /// Publisher namespace, matched by deny rules
    pub namespace: &'static str,
    /// Unique lookup name
    pub name: &'static str,
    /// Menu label
    pub display_name: &'static str,
    /// Menu group
    pub category: Category,
    /// Version, matched by deny rules
    pub version: Version,
    /// Scheduling and discovery flags
    pub flags: EffectFlags,
}

impl EffectInfo {
    /// Info with version 1.0.0 and no flags.
    pub const fn new(
        namespace: &'static str,
        name: &'static str,
        display_name: &'static str,
        category: Category,
    ) -> Self {
        Self {
            namespace,
            name,
            display_name,
            category,
            version: Version::new(1, 0, 0),
            flags: EffectFlags::NONE,
        }
    }

    /// Sets the version.
    pub const fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Sets the flags.
    pub const fn with_flags(mut self, flags: EffectFlags) -> Self {
        self.flags = flags;
        self
    }

    /// `true` for effects that must run on a single worker.
    pub const fn is_single_threaded(&self) -> bool {
        self.flags.contains(EffectFlags::SINGLE_THREADED)
    }
}

/// Fails with [`EffectError::Failed`] if `dst_bounds` does not match `src`.
///
/// Most kernels sample the source at destination coordinates.
pub fn ensure_same_bounds(src: &Surface, dst_bounds: Rect) -> EffectResult<()> {
    if src.bounds() != dst_bounds {
        return Err(EffectError::Core(pfx_core::Error::DimensionMismatch {
            a_width: dst_bounds.width,
            a_height: dst_bounds.height,
            b_width: src.width(),
            b_height: src.height(),
        }));
    }
    Ok(())
}
