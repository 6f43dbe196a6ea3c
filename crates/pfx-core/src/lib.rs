//! # pfx-core
//!
//! Core types for tiled, parallel effect rendering.
//!
//! This crate provides the data types every effect and renderer works on:
//!
//! - [`ColorBgra`] - 8-bit BGRA pixel
//! - [`Surface`] - Owned pixel buffer with a read-only hint
//! - [`Rect`], [`Scan`] - Rectangles and single-row runs
//! - [`Region`] - Arbitrary selection as a canonical set of rectangles
//! - [`slice_region`] - Partition of a region into disjoint tiles
//!
//! ## Crate Structure
//!
//! `pfx-core` has no internal dependencies. The renderer and the effect
//! kernels build on it:
//!
//! ```text
//! pfx-core (this crate)
//!    ^
//!    |
//!    +-- pfx-render (effect contract, tiled renderer, registry)
//!    |      ^
//!    |      +-- pfx-effects (blur, clouds, fractals, warps)
//!    |
//!    +-- pfx-cli, pfx-bench, pfx-tests
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use pfx_core::prelude::*;
//!
//! let selection = Region::ellipse(Rect::new(0, 0, 64, 64));
//! let tiles = slice_region(&selection, 8, Rect::from_size(64, 64)).unwrap();
//!
//! let covered: u64 = tiles.iter().flatten().map(|r| r.area()).sum();
//! assert_eq!(covered, selection.area());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod color;
pub mod error;
pub mod rect;
pub mod region;
pub mod slice;
pub mod surface;

// Re-exports for convenience
pub use color::{clamp_to_byte, clamp_to_byte_f64, ColorBgra};
pub use error::{Error, Result};
pub use rect::{Rect, Scan};
pub use region::Region;
pub use slice::{slice_range, slice_rects, slice_region};
pub use surface::{ReadOnlyGuard, SharedSurface, Surface};

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use pfx_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::color::{clamp_to_byte, clamp_to_byte_f64, ColorBgra};
    pub use crate::error::{Error, Result};
    pub use crate::rect::{Rect, Scan};
    pub use crate::region::Region;
    pub use crate::slice::{slice_region, slice_rects};
    pub use crate::surface::{ReadOnlyGuard, SharedSurface, Surface};
}
