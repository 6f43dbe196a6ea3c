//! CLI command implementations

pub mod describe;
pub mod list;
pub mod render;

use pfx_effects::builtin_registry_with_deny_list;
use pfx_render::{EffectRegistry, RenderConfig};

/// Built-in effects minus the config's deny list.
pub fn registry(config: &RenderConfig) -> EffectRegistry {
    builtin_registry_with_deny_list(config.deny.clone())
}

/// Format a pixel count for display
pub fn format_pixels(pixels: u64) -> String {
    const K: u64 = 1000;
    const M: u64 = K * 1000;

    if pixels >= M {
        format!("{:.2} Mpx", pixels as f64 / M as f64)
    } else if pixels >= K {
        format!("{:.1} Kpx", pixels as f64 / K as f64)
    } else {
        format!("{pixels} px")
    }
}
