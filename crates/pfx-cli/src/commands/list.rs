//! List command.
//!
//! Prints registered effects grouped by category, then any effects the
//! registry refused.

use crate::ListArgs;
use anyhow::Result;
use pfx_render::{Category, DynEffect, RenderConfig};

/// Runs the list command.
pub fn run(args: ListArgs, config: &RenderConfig, verbose: bool) -> Result<()> {
    let registry = super::registry(config);

    let categories: Vec<Category> = match args.category {
        Some(category) => vec![category],
        None => Category::ALL.to_vec(),
    };

    for category in categories {
        let effects = registry.list_by_category(category);
        if effects.is_empty() {
            continue;
        }
        println!("{category}:");
        for effect in effects {
            let info = effect.effect_info();
            if verbose {
                println!(
                    "  {:<16} {:<20} {}.{} v{}",
                    info.name, info.display_name, info.namespace, info.name, info.version
                );
            } else {
                println!("  {:<16} {}", info.name, info.display_name);
            }
        }
    }

    let errors = registry.load_errors();
    if !errors.is_empty() {
        println!();
        println!("Not loaded:");
        for error in errors {
            println!("  {error}");
        }
    }

    Ok(())
}
