//! Dynamic decoration configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

use super::env_parsed;
use crate::decorator::DECORATOR_CONFIGURATION;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoratorsConfig {
    /// Entity type the decorator configurations are stored in
    pub configuration_entity_type: String,
    /// Entity types never decorated, in addition to the configuration type
    pub excluded_entity_types: Vec<String>,
    /// Register the audit, readonly and required factories at startup
    pub builtin_factories: bool,
}

impl Default for DecoratorsConfig {
    fn default() -> Self {
        Self {
            configuration_entity_type: DECORATOR_CONFIGURATION.to_string(),
            excluded_entity_types: Vec::new(),
            builtin_factories: true,
        }
    }
}

impl DecoratorsConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(excluded) = env::var("MOLGENIS_DECORATOR_EXCLUDED") {
            self.excluded_entity_types = excluded
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(builtin) = env_parsed("MOLGENIS_DECORATOR_BUILTIN") {
            self.builtin_factories = builtin;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.configuration_entity_type.trim().is_empty() {
            bail!("decorators.configuration_entity_type must not be empty");
        }
        if self.excluded_entity_types.iter().any(|id| id.trim().is_empty()) {
            bail!("decorators.excluded_entity_types must not contain empty ids");
        }
        Ok(())
    }
}
