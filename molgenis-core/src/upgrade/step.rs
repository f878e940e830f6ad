//! Upgrade step definitions

use async_trait::async_trait;

use crate::storage::SqlTransaction;
use crate::Result;

/// A one-time migration from `from_version` to `from_version + 1`
#[async_trait]
pub trait UpgradeStep: Send + Sync {
    fn from_version(&self) -> u32;

    fn to_version(&self) -> u32 {
        self.from_version() + 1
    }

    fn description(&self) -> &str;

    /// Applies the step inside `tx`; the caller commits or rolls back
    async fn upgrade(&self, tx: &mut dyn SqlTransaction) -> Result<()>;
}

/// An upgrade step consisting of a fixed list of SQL statements
#[derive(Debug, Clone)]
pub struct SqlUpgradeStep {
    from_version: u32,
    description: String,
    statements: Vec<String>,
}

impl SqlUpgradeStep {
    pub fn new(from_version: u32, description: impl Into<String>) -> Self {
        Self {
            from_version,
            description: description.into(),
            statements: Vec::new(),
        }
    }

    pub fn with_statement(mut self, sql: impl Into<String>) -> Self {
        self.statements.push(sql.into());
        self
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }
}

#[async_trait]
impl UpgradeStep for SqlUpgradeStep {
    fn from_version(&self) -> u32 {
        self.from_version
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn upgrade(&self, tx: &mut dyn SqlTransaction) -> Result<()> {
        for sql in &self.statements {
            log::debug!("Upgrade {} -> {}: {}", self.from_version, self.to_version(), sql);
            tx.execute(sql).await?;
        }
        Ok(())
    }
}
