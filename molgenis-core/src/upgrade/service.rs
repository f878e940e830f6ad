//! Sequential execution of upgrade steps

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::step::UpgradeStep;
use super::version::VersionStore;
use crate::storage::SqlDatabase;
use crate::{Error, Result};

/// One step applied during an upgrade run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedStep {
    pub from_version: u32,
    pub to_version: u32,
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Outcome of [`UpgradeService::upgrade`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeReport {
    /// Version found in the version store, `None` on a fresh install
    pub from_version: Option<u32>,
    /// Version recorded after the run
    pub to_version: Option<u32>,
    pub fresh_install: bool,
    pub applied: Vec<AppliedStep>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl UpgradeReport {
    pub fn is_noop(&self) -> bool {
        !self.fresh_install && self.applied.is_empty()
    }
}

/// Runs registered upgrade steps strictly in version order
///
/// Every step runs in its own transaction and the new version is persisted
/// right after the commit, so a failing step leaves all earlier steps applied
/// and recorded.
pub struct UpgradeService {
    database: Arc<dyn SqlDatabase>,
    version_store: Arc<dyn VersionStore>,
    steps: Vec<Arc<dyn UpgradeStep>>,
}

impl UpgradeService {
    pub fn new(database: Arc<dyn SqlDatabase>, version_store: Arc<dyn VersionStore>) -> Self {
        Self {
            database,
            version_store,
            steps: Vec::new(),
        }
    }

    /// Appends a step; steps must form a contiguous version chain
    pub fn add_upgrade(&mut self, step: Arc<dyn UpgradeStep>) -> Result<()> {
        if step.to_version() != step.from_version() + 1 {
            return Err(Error::Upgrade {
                version: step.to_version(),
                reason: format!(
                    "Step [{}] must upgrade exactly one version, not from {} to {}",
                    step.description(),
                    step.from_version(),
                    step.to_version()
                ),
            });
        }
        if let Some(last) = self.steps.last() {
            if step.from_version() != last.to_version() {
                return Err(Error::Upgrade {
                    version: step.to_version(),
                    reason: format!(
                        "Step [{}] upgrades from version {} but the previous step ends at version {}",
                        step.description(),
                        step.from_version(),
                        last.to_version()
                    ),
                });
            }
        }
        self.steps.push(step);
        Ok(())
    }

    pub fn steps(&self) -> &[Arc<dyn UpgradeStep>] {
        &self.steps
    }

    /// Version the registered steps lead to
    pub fn latest_version(&self) -> Option<u32> {
        self.steps.last().map(|step| step.to_version())
    }

    /// Brings the persisted state up to the latest version
    ///
    /// A fresh install (no persisted version) is already in the latest shape:
    /// the latest version is recorded without running any step.
    pub async fn upgrade(&self) -> Result<UpgradeReport> {
        let started_at = Utc::now();
        let current = self.version_store.read_version().await?;

        let Some(current) = current else {
            if let Some(latest) = self.latest_version() {
                self.version_store.write_version(latest).await?;
                log::info!("Fresh install, recorded version {}", latest);
            }
            return Ok(UpgradeReport {
                from_version: None,
                to_version: self.latest_version(),
                fresh_install: true,
                applied: Vec::new(),
                started_at,
                finished_at: Utc::now(),
            });
        };

        if let Some(first) = self.steps.first() {
            if current < first.from_version() {
                return Err(Error::Upgrade {
                    version: first.from_version(),
                    reason: format!(
                        "Upgrading from version {} is not supported, the oldest supported version is {}",
                        current,
                        first.from_version()
                    ),
                });
            }
        }
        if let Some(latest) = self.latest_version() {
            if current > latest {
                return Err(Error::Upgrade {
                    version: current,
                    reason: format!(
                        "Persisted version {} is newer than the latest known version {}",
                        current, latest
                    ),
                });
            }
        }

        let pending: Vec<&Arc<dyn UpgradeStep>> =
            self.steps.iter().filter(|step| step.from_version() >= current).collect();
        if pending.is_empty() {
            log::debug!("Version {} is up to date", current);
        } else {
            log::info!("Upgrading from version {} ({} step(s) pending)", current, pending.len());
        }

        let mut applied = Vec::with_capacity(pending.len());
        for step in pending {
            applied.push(self.run_step(step.as_ref()).await?);
        }

        let to_version = applied.last().map(|step| step.to_version).unwrap_or(current);
        Ok(UpgradeReport {
            from_version: Some(current),
            to_version: Some(to_version),
            fresh_install: false,
            applied,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn run_step(&self, step: &dyn UpgradeStep) -> Result<AppliedStep> {
        let started_at = Utc::now();
        let to_version = step.to_version();
        log::info!("Upgrade from {} to {}: {}", step.from_version(), to_version, step.description());

        let failed = |e: Error| Error::Upgrade {
            version: to_version,
            reason: e.to_string(),
        };

        let mut tx = self.database.begin().await.map_err(failed)?;
        if let Err(e) = step.upgrade(tx.as_mut()).await {
            log::error!("Upgrade to version {} failed: {}", to_version, e);
            if let Err(rollback_err) = tx.rollback().await {
                log::error!("Rollback of upgrade to version {} failed: {}", to_version, rollback_err);
            }
            return Err(failed(e));
        }
        tx.commit().await.map_err(failed)?;
        self.version_store.write_version(to_version).await.map_err(failed)?;

        Ok(AppliedStep {
            from_version: step.from_version(),
            to_version,
            description: step.description().to_string(),
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JournalDatabase;
    use crate::upgrade::step::SqlUpgradeStep;
    use crate::upgrade::version::InMemoryVersionStore;

    fn service(database: &JournalDatabase, store: Arc<InMemoryVersionStore>) -> UpgradeService {
        let mut service = UpgradeService::new(Arc::new(database.clone()), store);
        for version in 1..4 {
            let step = SqlUpgradeStep::new(version, format!("step {}", version))
                .with_statement(format!("UPDATE \"settings\" SET \"v\" = {}", version + 1));
            service.add_upgrade(Arc::new(step)).unwrap();
        }
        service
    }

    #[tokio::test]
    async fn test_runs_pending_steps_in_order() {
        let database = JournalDatabase::new();
        let store = Arc::new(InMemoryVersionStore::new(Some(2)));
        let report = service(&database, store.clone()).upgrade().await.unwrap();

        let applied: Vec<u32> = report.applied.iter().map(|step| step.to_version).collect();
        assert_eq!(applied, vec![3, 4]);
        assert_eq!(report.to_version, Some(4));
        assert_eq!(store.read_version().await.unwrap(), Some(4));
        assert_eq!(database.commit_count().await, 2);
        assert_eq!(
            database.committed_statements().await,
            vec!["UPDATE \"settings\" SET \"v\" = 3", "UPDATE \"settings\" SET \"v\" = 4"]
        );

        // Already applied steps are skipped on the next run
        let again = service(&database, store).upgrade().await.unwrap();
        assert!(again.is_noop());
    }

    #[tokio::test]
    async fn test_fresh_install_records_latest_version() {
        let database = JournalDatabase::new();
        let store = Arc::new(InMemoryVersionStore::default());
        let report = service(&database, store.clone()).upgrade().await.unwrap();

        assert!(report.fresh_install);
        assert!(report.applied.is_empty());
        assert_eq!(store.read_version().await.unwrap(), Some(4));
        assert!(database.committed_statements().await.is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_earlier_steps_and_aborts_chain() {
        let database = JournalDatabase::new();
        database.fail_on("= 3").await;
        let store = Arc::new(InMemoryVersionStore::new(Some(1)));

        let err = service(&database, store.clone()).upgrade().await.unwrap_err();
        assert!(matches!(err, Error::Upgrade { version: 3, .. }));
        assert_eq!(store.read_version().await.unwrap(), Some(2));
        assert_eq!(database.committed_statements().await, vec!["UPDATE \"settings\" SET \"v\" = 2"]);
        assert_eq!(database.rollback_count().await, 1);
    }

    #[test]
    fn test_non_contiguous_steps_are_rejected() {
        let database = JournalDatabase::new();
        let mut service = UpgradeService::new(Arc::new(database), Arc::new(InMemoryVersionStore::default()));
        service.add_upgrade(Arc::new(SqlUpgradeStep::new(10, "ten"))).unwrap();
        assert!(service.add_upgrade(Arc::new(SqlUpgradeStep::new(12, "twelve"))).is_err());
        assert_eq!(service.latest_version(), Some(11));
    }

    #[tokio::test]
    async fn test_unsupported_versions_are_rejected() {
        let database = JournalDatabase::new();
        let too_old = Arc::new(InMemoryVersionStore::new(Some(0)));
        assert!(service(&database, too_old).upgrade().await.is_err());
        let too_new = Arc::new(InMemoryVersionStore::new(Some(9)));
        assert!(service(&database, too_new).upgrade().await.is_err());
    }
}
