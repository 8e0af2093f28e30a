//! Engine configuration.
//!
//! Everything has a default; embedders usually construct `EngineConfig::default()`
//! or load a partial JSON document next to the rest of their settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on resolver passes. Values below the snapshot size are
    /// raised to it, since an acyclic snapshot can need that many.
    pub pass_limit: Option<usize>,
    /// Run the cycle audit whenever the resolver has to fall back to zero.
    pub audit_cycles_on_fallback: bool,
    /// Emit a warning for each formula term whose target is missing.
    pub warn_on_dangling: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pass_limit: None,
            audit_cycles_on_fallback: true,
            warn_on_dangling: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of resolver passes allowed for a snapshot of `entity_count` entities.
    pub fn passes_for(&self, entity_count: usize) -> usize {
        self.pass_limit.map_or(entity_count, |limit| limit.max(entity_count))
    }
}
