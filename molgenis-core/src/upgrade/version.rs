//! Persisted platform version

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::Result;

/// Where the version of the persisted schema and configuration is kept
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Persisted version; `None` on a fresh install
    async fn read_version(&self) -> Result<Option<u32>>;

    async fn write_version(&self, version: u32) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct VersionFile {
    version: u32,
}

/// Keeps the version in a TOML file (`version = N`)
#[derive(Debug, Clone)]
pub struct FileVersionStore {
    path: PathBuf,
}

impl FileVersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl VersionStore for FileVersionStore {
    async fn read_version(&self) -> Result<Option<u32>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read version file: {}", self.path.display()))?;
        let file: VersionFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse version file: {}", self.path.display()))?;
        Ok(Some(file.version))
    }

    async fn write_version(&self, version: u32) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string(&VersionFile { version }).context("Failed to serialize version file")?;
        // Write then rename so a crash never leaves a truncated file
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, content)
            .await
            .with_context(|| format!("Failed to write version file: {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Keeps the version in memory
#[derive(Debug, Default)]
pub struct InMemoryVersionStore {
    version: RwLock<Option<u32>>,
}

impl InMemoryVersionStore {
    pub fn new(version: Option<u32>) -> Self {
        Self {
            version: RwLock::new(version),
        }
    }
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn read_version(&self) -> Result<Option<u32>> {
        Ok(*self.version.read().await)
    }

    async fn write_version(&self, version: u32) -> Result<()> {
        *self.version.write().await = Some(version);
        Ok(())
    }
}
