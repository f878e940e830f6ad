//! Transactional SQL execution seam
//!
//! The data core never talks to a database driver directly. Everything that
//! changes physical schema goes through [`SqlDatabase::begin`] and a
//! [`SqlTransaction`], so that a multi-statement alteration either commits as
//! a whole or not at all.

pub mod journal;

pub use journal::JournalDatabase;

use async_trait::async_trait;

use crate::Result;

/// A relational database that can open transactions
#[async_trait]
pub trait SqlDatabase: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn SqlTransaction>>;
}

/// An open transaction
///
/// Dropping a transaction without committing discards its statements.
#[async_trait]
pub trait SqlTransaction: Send {
    async fn execute(&mut self, sql: &str) -> Result<()>;
    async fn commit(&mut self) -> Result<()>;
    async fn rollback(&mut self) -> Result<()>;
}

/// Executes `statements` in order inside one transaction
///
/// Rolls back and returns the first error when any statement fails.
pub async fn execute_in_transaction(database: &dyn SqlDatabase, statements: &[String]) -> Result<()> {
    let mut tx = database.begin().await?;
    for sql in statements {
        log::debug!("Executing: {}", sql);
        if let Err(e) = tx.execute(sql).await {
            log::warn!("Statement failed, rolling back: {}", e);
            if let Err(rollback_err) = tx.rollback().await {
                log::error!("Rollback failed: {}", rollback_err);
            }
            return Err(e);
        }
    }
    tx.commit().await
}
