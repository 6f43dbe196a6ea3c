//! Describe command: an effect's identity and parameter table.

use crate::DescribeArgs;
use anyhow::Result;
use pfx_render::{DynEffect, RenderConfig};

/// Runs the describe command.
pub fn run(args: DescribeArgs, config: &RenderConfig) -> Result<()> {
    let registry = super::registry(config);
    let effect = registry.get_required(&args.effect)?;
    let info = effect.effect_info();

    println!("{} ({}.{} v{})", info.display_name, info.namespace, info.name, info.version);
    println!("Category: {}", info.category);
    if !info.flags.is_empty() {
        println!("Flags:    {:?}", info.flags);
    }

    let defs = effect.param_defs();
    if defs.is_empty() {
        println!("No parameters");
        return Ok(());
    }

    // Values from the config file are shown as the effective defaults
    let configured = config.param_values(info.name, &defs)?;

    println!();
    println!("Parameters:");
    for def in &defs {
        let value = configured.get(&def.name).copied().unwrap_or(def.default);
        println!("  {:<12} {:<18} {:<28} = {}", def.name, def.display_name, def.kind.to_string(), value);
    }

    Ok(())
}
