//! # pfx-effects
//!
//! Built-in effect kernels for the tiled renderer.
//!
//! | Effect | Name | Category |
//! |--------|------|----------|
//! | [`GaussianBlurEffect`] | `gaussian-blur` | Blurs |
//! | [`RadialBlurEffect`] | `radial-blur` | Blurs |
//! | [`ZoomBlurEffect`] | `zoom-blur` | Blurs |
//! | [`CloudsEffect`] | `clouds` | Render |
//! | [`MandelbrotEffect`] | `mandelbrot` | Render |
//! | [`JuliaEffect`] | `julia` | Render |
//! | [`AddNoiseEffect`] | `add-noise` | Noise |
//! | [`TwistEffect`] | `twist` | Distort |
//! | [`LevelsEffect`] | `levels` | Adjustments |
//!
//! Every effect reads the source anywhere and writes only its tile. None
//! keeps per-run data on the effect value: derived tables live in the
//! bound state or, for [`LevelsEffect`], in the worker's token clone.
//!
//! # Usage
//!
//! ```rust
//! use pfx_core::{ColorBgra, Surface};
//! use pfx_effects::{GaussianBlurEffect, GaussianBlurToken};
//! use pfx_render::render_serial;
//!
//! let src = Surface::filled(16, 16, ColorBgra::BLACK).unwrap();
//! let mut dst = Surface::new(16, 16).unwrap();
//! let token = GaussianBlurToken { radius: 3 };
//! render_serial(&GaussianBlurEffect, &token, &src, &mut dst, &[vec![src.bounds()]], 0).unwrap();
//! assert_eq!(dst, src);
//! ```
//!
//! By name, through the registry:
//!
//! ```rust
//! use pfx_effects::builtin_registry;
//! use pfx_render::DynEffect;
//!
//! let registry = builtin_registry();
//! let clouds = registry.get("clouds").unwrap();
//! assert_eq!(clouds.effect_info().display_name, "Clouds");
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod add_noise;
pub mod clouds;
pub mod fractal;
pub mod gaussian;
pub mod levels;
pub mod perlin;
pub mod radial;
mod sample;
pub mod twist;
pub mod zoom;

pub use add_noise::{AddNoiseEffect, AddNoiseToken};
pub use clouds::{BlendMode, CloudsEffect, CloudsToken};
pub use fractal::{FractalToken, JuliaEffect, MandelbrotEffect};
pub use gaussian::{GaussianBlurEffect, GaussianBlurToken};
pub use levels::{LevelsEffect, LevelsToken};
pub use radial::{RadialBlurEffect, RadialBlurToken};
pub use twist::{TwistEffect, TwistToken};
pub use zoom::{ZoomBlurEffect, ZoomBlurToken};

use pfx_render::{DenyRule, EffectRegistry};
use std::sync::Arc;

/// Registry source name of the built-in effects.
pub const SOURCE: &str = "pfx-effects";

/// Registry holding every built-in effect.
pub fn builtin_registry() -> EffectRegistry {
    builtin_registry_with_deny_list(Vec::new())
}

/// Registry holding every built-in effect not excluded by `deny`.
pub fn builtin_registry_with_deny_list(deny: Vec<DenyRule>) -> EffectRegistry {
    let mut registry = EffectRegistry::with_deny_list(deny);

    // Blurs
    registry.register(SOURCE, Arc::new(GaussianBlurEffect));
    registry.register(SOURCE, Arc::new(RadialBlurEffect));
    registry.register(SOURCE, Arc::new(ZoomBlurEffect));

    // Generators
    registry.register(SOURCE, Arc::new(CloudsEffect));
    registry.register(SOURCE, Arc::new(MandelbrotEffect));
    registry.register(SOURCE, Arc::new(JuliaEffect));

    // Noise, distort, adjustments
    registry.register(SOURCE, Arc::new(AddNoiseEffect));
    registry.register(SOURCE, Arc::new(TwistEffect));
    registry.register(SOURCE, Arc::new(LevelsEffect));

    registry.log_summary();
    registry
}
