//! Error types for effect binding and rendering.
//!
//! # Overview
//!
//! Two layers of errors exist:
//!
//! - [`EffectError`] - raised by an effect while building its token,
//!   binding, or rendering one tile. Parameter validation errors live here.
//! - [`RenderError`] - raised by the renderer to the thread that calls
//!   [`TiledRenderer::join`](crate::TiledRenderer::join). A kernel fault is
//!   wrapped as [`RenderError::Effect`] together with every other fault
//!   captured in the same run.
//!
//! Aborting a render is not an error; see
//! [`TiledRenderer::did_abort`](crate::TiledRenderer::did_abort).
//!
//! # Dependencies
//!
//! - [`thiserror`] - derive macros
//! - [`serde_yaml`] - config parse errors are carried verbatim

use std::fmt;
use thiserror::Error;

/// Result alias for effect operations.
pub type EffectResult<T> = Result<T, EffectError>;

/// Result alias for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised by an effect.
#[derive(Debug, Error)]
pub enum EffectError {
    /// A parameter value is outside its declared range.
    #[error("parameter '{name}' value {value} out of range [{min}, {max}]")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Offending value, formatted
        value: String,
        /// Lower bound, formatted
        min: String,
        /// Upper bound, formatted
        max: String,
    },

    /// A parameter name the effect does not declare.
    #[error("unknown parameter: {name}")]
    UnknownParameter {
        /// Parameter name
        name: String,
    },

    /// A parameter value of the wrong kind, or text that does not parse.
    #[error("parameter '{name}' type mismatch: expected {expected}, got {got}")]
    ParameterType {
        /// Parameter name
        name: String,
        /// Expected kind
        expected: String,
        /// What was supplied
        got: String,
    },

    /// Kernel-reported failure.
    #[error("{0}")]
    Failed(String),

    /// The kernel panicked; the payload message is kept.
    #[error("kernel panicked: {0}")]
    Panicked(String),

    /// Surface or slicing error.
    #[error(transparent)]
    Core(#[from] pfx_core::Error),
}

impl EffectError {
    /// Shorthand for [`EffectError::Failed`].
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// One fault captured during a run.
#[derive(Debug)]
pub struct TileFault {
    /// Tile being rendered, `None` when binding failed.
    pub tile: Option<usize>,
    /// Worker slot that hit the fault (0 is the controller).
    pub worker: usize,
    /// The effect's error.
    pub error: EffectError,
}

impl fmt::Display for TileFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tile {
            Some(tile) => write!(f, "tile {tile} (worker {}): {}", self.worker, self.error),
            None => write!(f, "bind: {}", self.error),
        }
    }
}

/// Errors surfaced by the renderer and its front-ends.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A kernel failed. `source` is the first captured fault; later faults
    /// of the same run are kept in `suppressed`, in capture order.
    #[error("effect failed{}: {source}", tile_suffix(.tile, .suppressed.len()))]
    Effect {
        /// First captured error
        source: EffectError,
        /// Tile of the first fault, `None` if binding failed
        tile: Option<usize>,
        /// Faults captured after the first one
        suppressed: Vec<TileFault>,
    },

    /// The controller thread itself panicked.
    #[error("render controller panicked: {0}")]
    ControllerPanicked(String),

    /// Worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Controller thread could not be spawned.
    #[error("failed to spawn render controller: {0}")]
    Spawn(std::io::Error),

    /// Surface or slicing error.
    #[error(transparent)]
    Core(#[from] pfx_core::Error),

    /// Parameter or token error reported before a run starts.
    #[error(transparent)]
    Params(#[from] EffectError),

    /// I/O error reading a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Semantically invalid config.
    #[error("invalid config: {0}")]
    Config(String),

    /// No effect with this name is registered.
    #[error("unknown effect: {0}")]
    UnknownEffect(String),
}

impl RenderError {
    /// Number of faults carried by an [`RenderError::Effect`], zero otherwise.
    pub fn fault_count(&self) -> usize {
        match self {
            Self::Effect { suppressed, .. } => 1 + suppressed.len(),
            _ => 0,
        }
    }
}

fn tile_suffix(tile: &Option<usize>, suppressed: usize) -> String {
    let location = match tile {
        Some(t) => format!(" on tile {t}"),
        None => " while binding".to_string(),
    };
    if suppressed == 0 {
        location
    } else {
        format!("{location} (+{suppressed} more)")
    }
}
