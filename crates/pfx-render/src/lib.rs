//! # pfx-render
//!
//! Effect contract and tiled parallel renderer.
//!
//! # Overview
//!
//! - [`Effect`] - kernel contract: parameters, token, `bind`, `render_tile`
//! - [`TiledRenderer`] - schedules an effect over a sliced region on a
//!   worker pool, with abort, fault capture and progress listeners
//! - [`render_serial`] - the same tiles in order on the calling thread
//! - [`ParamDef`], [`ParamValues`] - typed, range-checked parameters
//! - [`DynEffect`], [`EffectRegistry`] - type-erased effects by name,
//!   with a version-gated deny-list
//! - [`RenderConfig`] - YAML scheduling, deny-list and parameter file
//!
//! # Run Lifecycle
//!
//! ```text
//! start(token)
//!   │  listeners: on_starting
//!   ▼
//! controller thread ── bind once ──► tile 0 on controller
//!   │                                   │ on_rendered_tile(0)
//!   ▼                                   ▼
//! worker pool: tile i on slot i % workers, in order of i
//!   │  each tile: check abort, render, on_rendered_tile(i)
//!   ▼
//! drain ──► Completed (on_finished) | Aborted | Faulted
//!   │
//! join() ── surfaces the first fault, keeps the rest as suppressed
//! ```
//!
//! # Usage
//!
//! ```rust
//! use std::sync::{Arc, RwLock};
//! use pfx_core::{ColorBgra, Rect, Region, Surface};
//! use pfx_render::prelude::*;
//!
//! struct Fill;
//!
//! impl Effect for Fill {
//!     type Token = ColorBgra;
//!     type State = ();
//!
//!     fn info(&self) -> EffectInfo {
//!         EffectInfo::new("demo", "fill", "Fill", Category::Render)
//!     }
//!
//!     fn token_from_params(&self, _: &ParamValues) -> EffectResult<ColorBgra> {
//!         Ok(ColorBgra::WHITE)
//!     }
//!
//!     fn bind(&self, _: &ColorBgra, _: &Surface, _: Rect) -> EffectResult<()> {
//!         Ok(())
//!     }
//!
//!     fn render_tile(&self, _: &(), ctx: &mut TileContext<'_, ColorBgra>) -> EffectResult<()> {
//!         let color = *ctx.token();
//!         ctx.writer().fill(color);
//!         Ok(())
//!     }
//! }
//!
//! let src = Arc::new(Surface::new(32, 32).unwrap());
//! let dst = Arc::new(RwLock::new(Surface::new(32, 32).unwrap()));
//! let region = Region::ellipse(Rect::from_size(32, 32));
//!
//! let mut renderer = TiledRenderer::new(
//!     Arc::new(Fill),
//!     src,
//!     dst.clone(),
//!     &region,
//!     RenderSettings::default().with_workers(2),
//! )
//! .unwrap();
//! renderer.start(&ColorBgra::WHITE).unwrap();
//! renderer.join().unwrap();
//!
//! assert_eq!(dst.read().unwrap().pixel(16, 16), ColorBgra::WHITE);
//! assert_eq!(dst.read().unwrap().pixel(0, 0), ColorBgra::TRANSPARENT_BLACK);
//! ```
//!
//! # Dependencies
//!
//! - `pfx-core` - surfaces, regions, slicing
//! - `rayon` - worker pool
//! - `rand` - per-tile random streams
//! - `serde`, `serde_yaml` - config files
//! - `thiserror`, `tracing`
//!
//! # Used By
//!
//! - `pfx-effects` - built-in kernels
//! - `pfx-cli` - `pfx` command

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bound;
pub mod config;
pub mod context;
pub mod dynamic;
pub mod effect;
pub mod error;
pub mod listener;
pub mod params;
pub mod registry;
pub mod renderer;
pub mod settings;
pub mod writer;

// Re-exports for convenience
pub use bound::BoundEffect;
pub use config::{RenderConfig, RenderSection};
pub use context::{tile_seed, TileContext, TileParts};
pub use dynamic::{DynEffect, RenderReport, RenderRequest};
pub use effect::{ensure_same_bounds, Category, Effect, EffectFlags, EffectInfo, Version};
pub use error::{EffectError, EffectResult, RenderError, RenderResult, TileFault};
pub use listener::{ProgressCounter, RenderListener};
pub use params::{parse_assignment, ParamDef, ParamKind, ParamValue, ParamValues};
pub use registry::{DenyRule, EffectRegistry, LoadError};
pub use renderer::{render_serial, AbortHandle, RenderState, TiledRenderer};
pub use settings::RenderSettings;
pub use writer::{split_tiles, TileWriter};

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use pfx_render::prelude::*;
/// ```
pub mod prelude {
    pub use crate::context::TileContext;
    pub use crate::dynamic::DynEffect;
    pub use crate::effect::{Category, Effect, EffectFlags, EffectInfo, Version};
    pub use crate::error::{EffectError, EffectResult, RenderError, RenderResult};
    pub use crate::listener::{ProgressCounter, RenderListener};
    pub use crate::params::{ParamDef, ParamValue, ParamValues};
    pub use crate::registry::EffectRegistry;
    pub use crate::renderer::{render_serial, TiledRenderer};
    pub use crate::settings::RenderSettings;
}
