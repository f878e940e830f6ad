//! Logging configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info`, `debug`, `trace` or `off`
    pub level: String,
    /// `json` or `human`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(level) = env::var("MOLGENIS_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(format) = env::var("MOLGENIS_LOG_FORMAT") {
            self.format = format;
        }
    }

    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        log::LevelFilter::from_str(&self.level)
            .map_err(|_| anyhow::anyhow!("Invalid logging.level '{}'", self.level))
    }

    pub fn validate(&self) -> Result<()> {
        self.level_filter()?;
        if !matches!(self.format.as_str(), "json" | "human") {
            bail!("Invalid logging.format '{}', expected 'json' or 'human'", self.format);
        }
        Ok(())
    }
}
