//! YAML render configuration.
//!
//! ```yaml
//! render:
//!   workers: 4
//!   tiles_per_worker: 8
//!   seed: 42
//! deny:
//!   - namespace: pfx
//!     name: twist
//!     max_version: "1.0.0"
//! params:
//!   gaussian-blur:
//!     radius: 6
//!   clouds:
//!     blend: multiply
//!     from: "ff8000"
//! ```
//!
//! Every section is optional. Command-line values override file values.

use crate::error::{EffectError, RenderError, RenderResult};
use crate::params::{ParamDef, ParamValues};
use crate::registry::DenyRule;
use crate::settings::RenderSettings;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// `render:` section. Absent keys keep the caller's settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    /// Worker threads
    pub workers: Option<usize>,
    /// Tiles per worker
    pub tiles_per_worker: Option<usize>,
    /// Run seed
    pub seed: Option<u64>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Scheduling overrides
    pub render: RenderSection,
    /// Effects to reject at registration
    pub deny: Vec<DenyRule>,
    /// Parameter values keyed by effect name, then parameter name
    pub params: BTreeMap<String, BTreeMap<String, Value>>,
}

impl RenderConfig {
    /// Parses and validates YAML text.
    pub fn from_yaml_str(text: &str) -> RenderResult<Self> {
        let config: RenderConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a YAML file.
    pub fn load(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading render config");
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    fn validate(&self) -> RenderResult<()> {
        if self.render.workers == Some(0) {
            return Err(RenderError::Config("render.workers must be at least 1".into()));
        }
        if self.render.tiles_per_worker == Some(0) {
            return Err(RenderError::Config(
                "render.tiles_per_worker must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Applies the `render:` overrides to `settings`.
    pub fn apply(&self, mut settings: RenderSettings) -> RenderSettings {
        if let Some(workers) = self.render.workers {
            settings.worker_count = workers;
        }
        if let Some(tiles) = self.render.tiles_per_worker {
            settings.tiles_per_worker = tiles;
        }
        if let Some(seed) = self.render.seed {
            settings.seed = seed;
        }
        settings
    }

    /// Parameter values configured for `effect`, parsed against `defs`.
    ///
    /// Returns an empty list when the file has no entry for the effect.
    pub fn param_values(&self, effect: &str, defs: &[ParamDef]) -> RenderResult<ParamValues> {
        let mut values = ParamValues::new();
        let Some(entries) = self.params.get(effect) else {
            return Ok(values);
        };
        for (name, value) in entries {
            let def = defs
                .iter()
                .find(|d| d.name == *name)
                .ok_or_else(|| EffectError::UnknownParameter { name: name.clone() })?;
            let text = yaml_to_text(value).ok_or_else(|| {
                RenderError::Config(format!("params.{effect}.{name}: unsupported value {value:?}"))
            })?;
            values.set(name, def.parse_value(&text)?);
        }
        Ok(values)
    }
}

/// Textual form of a scalar, or of a two-element sequence as `x,y`.
fn yaml_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(items) if items.len() == 2 => {
            let x = items[0].as_f64()?;
            let y = items[1].as_f64()?;
            Some(format!("{x},{y}"))
        }
        _ => None,
    }
}
