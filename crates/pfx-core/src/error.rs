//! Error types for pfx-core operations.
//!
//! # Overview
//!
//! The [`Error`] enum covers the failure modes of the leaf data types:
//! - Surface construction and bounds-checked addressing
//! - Region slicing preconditions
//! - Splitting a destination buffer into per-tile row spans
//!
//! # Usage
//!
//! ```rust
//! use pfx_core::{Error, Result};
//!
//! fn check(x: i32, y: i32, width: i32, height: i32) -> Result<()> {
//!     if x < 0 || y < 0 || x >= width || y >= height {
//!         return Err(Error::OutOfBounds { x, y, width, height });
//!     }
//!     Ok(())
//! }
//!
//! assert!(check(3, 3, 2, 2).is_err());
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation
//!
//! # Used By
//!
//! - [`crate::surface::Surface`] - Buffer construction and addressing
//! - [`crate::slice`] - Slice count validation
//! - `pfx-render` - Wrapped by `EffectError` and `RenderError`

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by surfaces, regions and the region slicer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Pixel coordinates are outside surface bounds.
    #[error("pixel ({x}, {y}) out of bounds for surface {width}x{height}")]
    OutOfBounds {
        /// X coordinate that was out of bounds
        x: i32,
        /// Y coordinate that was out of bounds
        y: i32,
        /// Surface width
        width: i32,
        /// Surface height
        height: i32,
    },

    /// Surface dimensions are unusable.
    ///
    /// Returned when width or height is not positive, or when the pixel
    /// buffer length does not match `width * height`.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: i32,
        /// Requested height
        height: i32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Two surfaces that must match in size do not.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First surface width
        a_width: i32,
        /// First surface height
        a_height: i32,
        /// Second surface width
        b_width: i32,
        /// Second surface height
        b_height: i32,
    },

    /// A region was sliced into zero pieces.
    #[error("slice count must be at least 1, got {0}")]
    InvalidSliceCount(usize),

    /// Two tiles claim the same destination pixels.
    ///
    /// Tiles produced by [`crate::slice::slice_region`] never overlap; this
    /// is only reachable with hand-built tile lists.
    #[error("tiles {first} and {second} overlap at row {y}")]
    OverlappingTiles {
        /// Tile that claimed the row span first
        first: usize,
        /// Tile that claimed an overlapping span
        second: usize,
        /// Row where the overlap was found
        y: i32,
    },

    /// A write was attempted while the surface is flagged read-only.
    #[error("surface is read-only while a render pass is using it")]
    ReadOnly,
}
