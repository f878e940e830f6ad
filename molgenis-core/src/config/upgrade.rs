//! Upgrade chain configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

use super::env_parsed;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeConfig {
    pub enabled: bool,
    /// TOML file recording the version of the persisted state
    pub version_file: String,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            version_file: "./data/version.toml".to_string(),
        }
    }
}

impl UpgradeConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Some(enabled) = env_parsed("MOLGENIS_UPGRADE_ENABLED") {
            self.enabled = enabled;
        }
        if let Ok(file) = env::var("MOLGENIS_VERSION_FILE") {
            self.version_file = file;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.version_file.trim().is_empty() {
            bail!("upgrade.version_file is required when upgrades are enabled");
        }
        Ok(())
    }
}
