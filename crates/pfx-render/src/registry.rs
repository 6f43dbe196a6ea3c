//! Effect registry: by-name lookup, category filtering and a deny-list.

use crate::dynamic::DynEffect;
use crate::effect::{Category, EffectFlags, EffectInfo, Version};
use crate::error::{RenderError, RenderResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Excludes every version up to `max_version` of one effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyRule {
    /// Effect namespace
    pub namespace: String,
    /// Effect name
    pub name: String,
    /// Highest affected version, inclusive
    pub max_version: Version,
}

impl DenyRule {
    /// Creates a rule.
    pub fn new(namespace: &str, name: &str, max_version: Version) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            max_version,
        }
    }

    /// `true` if the rule excludes `info`.
    pub fn matches(&self, info: &EffectInfo) -> bool {
        self.namespace == info.namespace && self.name == info.name && info.version <= self.max_version
    }
}

/// An effect that could not be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    /// Where the effect came from, e.g. a crate or plugin name
    pub source: String,
    /// `namespace.name` of the effect
    pub effect: String,
    /// Why it was rejected
    pub cause: String,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.effect, self.source, self.cause)
    }
}

/// Registry of available effects, keyed by name.
pub struct EffectRegistry {
    effects: BTreeMap<&'static str, Arc<dyn DynEffect>>,
    deny: Vec<DenyRule>,
    errors: Vec<LoadError>,
}

impl EffectRegistry {
    /// Empty registry without deny rules.
    pub fn new() -> Self {
        Self {
            effects: BTreeMap::new(),
            deny: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Empty registry that rejects effects matching `deny`.
    pub fn with_deny_list(deny: Vec<DenyRule>) -> Self {
        Self {
            deny,
            ..Self::new()
        }
    }

    /// Registers `effect` from `source`.
    ///
    /// Abstract and deprecated effects are skipped silently. Denied effects
    /// and duplicate names are rejected and recorded in
    /// [`load_errors`](Self::load_errors). Returns `true` if the effect
    /// became available.
    pub fn register(&mut self, source: &str, effect: Arc<dyn DynEffect>) -> bool {
        let info = effect.effect_info();
        let id = format!("{}.{}", info.namespace, info.name);

        if info.flags.contains(EffectFlags::ABSTRACT) || info.flags.contains(EffectFlags::DEPRECATED) {
            debug!(effect = %id, flags = ?info.flags, "skipping effect");
            return false;
        }
        let cause = if let Some(rule) = self.deny.iter().find(|r| r.matches(&info)) {
            Some(format!(
                "version {} is on the deny-list (up to {})",
                info.version, rule.max_version
            ))
        } else if self.effects.contains_key(info.name) {
            Some(format!("name '{}' is already registered", info.name))
        } else {
            None
        };

        match cause {
            Some(cause) => {
                warn!(effect = %id, source, %cause, "effect not loaded");
                self.errors.push(LoadError {
                    source: source.to_string(),
                    effect: id,
                    cause,
                });
                false
            }
            None => {
                self.effects.insert(info.name, effect);
                true
            }
        }
    }

    /// Logs a summary of the registry.
    pub fn log_summary(&self) {
        info!(
            count = self.effects.len(),
            rejected = self.errors.len(),
            "registered effects"
        );
    }

    /// Infos of all available effects, sorted by name.
    pub fn available(&self) -> Vec<EffectInfo> {
        self.effects.values().map(|e| e.effect_info()).collect()
    }

    /// Effects that were rejected.
    pub fn load_errors(&self) -> &[LoadError] {
        &self.errors
    }

    /// Looks up an effect by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn DynEffect>> {
        self.effects.get(name).cloned()
    }

    /// Looks up an effect by name, failing with [`RenderError::UnknownEffect`].
    pub fn get_required(&self, name: &str) -> RenderResult<Arc<dyn DynEffect>> {
        self.get(name)
            .ok_or_else(|| RenderError::UnknownEffect(name.to_string()))
    }

    /// Effects of one category, sorted by name.
    pub fn list_by_category(&self, category: Category) -> Vec<Arc<dyn DynEffect>> {
        self.effects
            .values()
            .filter(|e| e.effect_info().category == category)
            .cloned()
            .collect()
    }

    /// Number of available effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// `true` if no effect is available.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("effects", &self.effects.keys().collect::<Vec<_>>())
            .field("deny", &self.deny)
            .field("errors", &self.errors)
            .finish()
    }
}
