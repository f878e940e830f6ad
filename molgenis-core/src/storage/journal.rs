//! In-process journaling database
//!
//! Records committed statements instead of executing them. Used for dry runs,
//! for the upgrade chain in embedded deployments and throughout the tests.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{SqlDatabase, SqlTransaction};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct JournalState {
    committed: Vec<String>,
    commits: usize,
    rollbacks: usize,
    fail_on: Option<String>,
}

/// A database that journals the statements of committed transactions
#[derive(Debug, Default, Clone)]
pub struct JournalDatabase {
    state: Arc<Mutex<JournalState>>,
}

impl JournalDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every statement containing `fragment` fail
    pub async fn fail_on(&self, fragment: impl Into<String>) {
        self.state.lock().await.fail_on = Some(fragment.into());
    }

    pub async fn clear_failure(&self) {
        self.state.lock().await.fail_on = None;
    }

    /// Statements of all committed transactions, in execution order
    pub async fn committed_statements(&self) -> Vec<String> {
        self.state.lock().await.committed.clone()
    }

    pub async fn commit_count(&self) -> usize {
        self.state.lock().await.commits
    }

    pub async fn rollback_count(&self) -> usize {
        self.state.lock().await.rollbacks
    }

    /// Forgets the journal and the counters; keeps the failure rule
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.committed.clear();
        state.commits = 0;
        state.rollbacks = 0;
    }
}

#[async_trait]
impl SqlDatabase for JournalDatabase {
    async fn begin(&self) -> Result<Box<dyn SqlTransaction>> {
        Ok(Box::new(JournalTransaction {
            state: self.state.clone(),
            pending: Vec::new(),
            finished: false,
        }))
    }
}

struct JournalTransaction {
    state: Arc<Mutex<JournalState>>,
    pending: Vec<String>,
    finished: bool,
}

impl JournalTransaction {
    fn ensure_open(&self) -> Result<()> {
        if self.finished {
            return Err(Error::Storage("Transaction already finished".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SqlTransaction for JournalTransaction {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.ensure_open()?;
        let state = self.state.lock().await;
        if let Some(fragment) = &state.fail_on {
            if sql.contains(fragment.as_str()) {
                return Err(Error::Storage(format!("Statement rejected: {}", sql)));
            }
        }
        drop(state);
        self.pending.push(sql.to_string());
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.finished = true;
        let mut state = self.state.lock().await;
        state.committed.append(&mut self.pending);
        state.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.finished = true;
        self.pending.clear();
        self.state.lock().await.rollbacks += 1;
        Ok(())
    }
}
