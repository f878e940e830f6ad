//! Configuration system for the data core
//!
//! Values are resolved in the following order (highest priority wins):
//!
//! 1. **Environment Variables** (`MOLGENIS_*`)
//! 2. **Config File** (molgenis.toml)
//! 3. **Defaults**
//!
//! # Example
//!
//! ```no_run
//! use molgenis_core::config::MolgenisConfig;
//!
//! let config = MolgenisConfig::load()?;
//! config.validate()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod database;
pub mod decorators;
pub mod logging;
pub mod upgrade;

pub use database::DatabaseConfig;
pub use decorators::DecoratorsConfig;
pub use logging::LoggingConfig;
pub use upgrade::UpgradeConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Parsed value of an environment variable, `None` when unset or unparsable
pub(crate) fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring invalid {} '{}'", name, raw);
            None
        }
    }
}

/// Complete data core configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MolgenisConfig {
    pub database: DatabaseConfig,
    pub decorators: DecoratorsConfig,
    pub upgrade: UpgradeConfig,
    pub logging: LoggingConfig,
}

impl MolgenisConfig {
    /// Load configuration with full supersedence chain
    pub fn load() -> Result<Self> {
        Self::load_from("molgenis.toml")
    }

    /// Load configuration from a specific file, falling back to defaults when it is missing
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        }

        config.apply_env_vars();

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.database.merge(other.database);
        self.decorators.merge(other.decorators);
        self.upgrade.merge(other.upgrade);
        self.logging.merge(other.logging);
    }

    pub fn apply_env_vars(&mut self) {
        self.database.apply_env_vars();
        self.decorators.apply_env_vars();
        self.upgrade.apply_env_vars();
        self.logging.apply_env_vars();
    }

    pub fn validate(&self) -> Result<()> {
        self.database.validate()?;
        self.decorators.validate()?;
        self.upgrade.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MolgenisConfig::default();
        assert_eq!(config.database.backend, "PostgreSQL");
        assert_eq!(config.database.default_string_length, 255);
        assert_eq!(config.decorators.configuration_entity_type, "sys_dec_DecoratorConfiguration");
        assert!(config.decorators.builtin_factories);
        assert!(config.upgrade.enabled);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("molgenis.toml");
        std::fs::write(
            &path,
            "[database]\ndefault_string_length = 512\n\n[decorators]\nexcluded_entity_types = [\"sys_Audit\"]\n",
        )
        .unwrap();

        let config = MolgenisConfig::from_file(&path).unwrap();
        assert_eq!(config.database.default_string_length, 512);
        assert_eq!(config.database.backend, "PostgreSQL");
        assert_eq!(config.decorators.excluded_entity_types, vec!["sys_Audit"]);
        assert!(config.decorators.builtin_factories);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = MolgenisConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.upgrade.version_file, "./data/version.toml");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = MolgenisConfig::default();
        config.database.default_string_length = 0;
        assert!(config.validate().is_err());

        let mut config = MolgenisConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = MolgenisConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = MolgenisConfig::default();
        config.database.backend = "Elasticsearch".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unparsable_env_value_is_ignored() {
        std::env::set_var("MOLGENIS_CONFIG_TEST_FLAG", "maybe");
        assert_eq!(env_parsed::<bool>("MOLGENIS_CONFIG_TEST_FLAG"), None);
        std::env::set_var("MOLGENIS_CONFIG_TEST_FLAG", " false ");
        assert_eq!(env_parsed::<bool>("MOLGENIS_CONFIG_TEST_FLAG"), Some(false));
        std::env::remove_var("MOLGENIS_CONFIG_TEST_FLAG");
        assert_eq!(env_parsed::<bool>("MOLGENIS_CONFIG_TEST_FLAG"), None);
    }

    #[test]
    fn test_invalid_builtin_factories_flag_keeps_default() {
        // Only invalid values here, other tests load with the default
        std::env::set_var("MOLGENIS_DECORATOR_BUILTIN", "yes");
        let mut decorators = DecoratorsConfig::default();
        decorators.apply_env_vars();
        std::env::remove_var("MOLGENIS_DECORATOR_BUILTIN");
        assert!(decorators.builtin_factories);
    }
}
