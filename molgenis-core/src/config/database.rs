//! Relational backend configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

use super::env_parsed;
use crate::postgresql::{DEFAULT_STRING_LENGTH, POSTGRESQL};

/// Longest `character varying` PostgreSQL accepts
const MAX_VARCHAR_LENGTH: u32 = 10_485_760;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: String,
    /// Length of string-like columns without an explicit max length
    pub default_string_length: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: POSTGRESQL.to_string(),
            default_string_length: DEFAULT_STRING_LENGTH,
        }
    }
}

impl DatabaseConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(backend) = env::var("MOLGENIS_DB_BACKEND") {
            self.backend = backend;
        }
        if let Some(length) = env_parsed("MOLGENIS_DEFAULT_STRING_LENGTH") {
            self.default_string_length = length;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend != POSTGRESQL {
            bail!("Unsupported backend '{}', only {} is available", self.backend, POSTGRESQL);
        }
        if self.default_string_length == 0 || self.default_string_length > MAX_VARCHAR_LENGTH {
            bail!(
                "database.default_string_length must be between 1 and {}, got {}",
                MAX_VARCHAR_LENGTH,
                self.default_string_length
            );
        }
        Ok(())
    }
}
