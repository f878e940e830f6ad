//! Startup sequencing
//!
//! [`Bootstrapper::bootstrap`] publishes STARTED, brings persisted state up to
//! date through the upgrade chain, registers the decorator factories and
//! applies the configured exclusions, then publishes FINISHED. Only that last
//! event switches dynamic decoration on. Any failure aborts bootstrapping
//! before FINISHED is published, so the process never serves requests in a
//! partially migrated state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::MolgenisConfig;
use crate::decorator::{
    builtin_factories, AuditTrail, DecoratorConfigurationStore, DynamicRepositoryDecoratorFactory,
    DynamicRepositoryDecoratorRegistry,
};
use crate::lifecycle::{BootstrapState, BootstrappingEvent, BootstrappingEventPublisher};
use crate::storage::SqlDatabase;
use crate::upgrade::{builtin_steps, FileVersionStore, UpgradeReport, UpgradeService};
use crate::{Error, Result};

/// Outcome of a successful bootstrap
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    /// `None` when upgrades are disabled or no upgrade service was given
    pub upgrade: Option<UpgradeReport>,
    /// Registered decorator factory ids, sorted
    pub factory_ids: Vec<String>,
}

pub struct Bootstrapper {
    config: MolgenisConfig,
    publisher: Arc<BootstrappingEventPublisher>,
    state: Arc<BootstrapState>,
    registry: Arc<DynamicRepositoryDecoratorRegistry>,
    audit_trail: Arc<AuditTrail>,
    upgrade_service: Option<UpgradeService>,
    factories: Vec<Arc<dyn DynamicRepositoryDecoratorFactory>>,
    started: AtomicBool,
}

impl Bootstrapper {
    pub fn new(config: MolgenisConfig, store: Arc<dyn DecoratorConfigurationStore>) -> Self {
        let state = Arc::new(BootstrapState::new());
        let registry = Arc::new(DynamicRepositoryDecoratorRegistry::new(store, state.clone()));
        Self {
            config,
            publisher: Arc::new(BootstrappingEventPublisher::new()),
            state,
            registry,
            audit_trail: Arc::new(AuditTrail::new()),
            upgrade_service: None,
            factories: Vec::new(),
            started: AtomicBool::new(false),
        }
    }

    pub fn with_upgrade_service(mut self, service: UpgradeService) -> Self {
        self.upgrade_service = Some(service);
        self
    }

    /// Registers an application factory next to the built-in ones
    pub fn with_factory(mut self, factory: Arc<dyn DynamicRepositoryDecoratorFactory>) -> Self {
        self.factories.push(factory);
        self
    }

    pub fn config(&self) -> &MolgenisConfig {
        &self.config
    }

    pub fn publisher(&self) -> &Arc<BootstrappingEventPublisher> {
        &self.publisher
    }

    pub fn state(&self) -> &Arc<BootstrapState> {
        &self.state
    }

    pub fn registry(&self) -> &Arc<DynamicRepositoryDecoratorRegistry> {
        &self.registry
    }

    /// Trail shared by every repository decorated with the `audit` factory
    pub fn audit_trail(&self) -> &Arc<AuditTrail> {
        &self.audit_trail
    }

    /// Runs the startup sequence; may only be called once
    pub async fn bootstrap(&self) -> Result<BootstrapReport> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(Error::Config("Bootstrapping already ran".to_string()));
        }
        self.config.validate()?;
        let configured = &self.config.decorators.configuration_entity_type;
        if self.registry.configuration_entity_type() != configured.as_str() {
            return Err(Error::Config(format!(
                "Decorator configurations are stored in '{}' but '{}' is configured",
                self.registry.configuration_entity_type(),
                configured
            )));
        }

        self.publisher.subscribe(self.state.clone()).await;
        self.publisher.publish(BootstrappingEvent::started()).await;

        let upgrade = match &self.upgrade_service {
            Some(service) if self.config.upgrade.enabled => match service.upgrade().await {
                Ok(report) => Some(report),
                Err(e) => {
                    log::error!("Bootstrapping aborted: {}", e);
                    return Err(e);
                }
            },
            Some(_) => {
                log::info!("Upgrades disabled, skipping upgrade chain");
                None
            }
            None => None,
        };

        if self.config.decorators.builtin_factories {
            for factory in builtin_factories(self.audit_trail.clone()) {
                self.registry.add_factory(factory)?;
            }
        }
        for factory in &self.factories {
            self.registry.add_factory(factory.clone())?;
        }

        for entity_type_id in &self.config.decorators.excluded_entity_types {
            self.registry.exclude_entity_type(entity_type_id.clone());
        }

        self.publisher.publish(BootstrappingEvent::finished()).await;

        Ok(BootstrapReport {
            upgrade,
            factory_ids: self.registry.factory_ids(),
        })
    }
}

/// Upgrade service with the shipped steps, recording the version in the configured file
pub fn default_upgrade_service(config: &MolgenisConfig, database: Arc<dyn SqlDatabase>) -> Result<UpgradeService> {
    let version_store = Arc::new(FileVersionStore::new(&config.upgrade.version_file));
    let mut service = UpgradeService::new(database, version_store);
    for step in builtin_steps(config.database.default_string_length) {
        service.add_upgrade(step)?;
    }
    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::meta::{DecoratorConfiguration, DecoratorParameters, DECORATOR_CONFIGURATION};
    use crate::decorator::RepositoryDecoratorConfigurationStore;
    use crate::storage::JournalDatabase;
    use crate::testing::{entity, person_repository, TaggingDecoratorFactory};
    use crate::upgrade::{InMemoryVersionStore, VersionStore};
    use serde_json::json;

    async fn store_with_readonly_person() -> Arc<RepositoryDecoratorConfigurationStore> {
        let store = Arc::new(RepositoryDecoratorConfigurationStore::in_memory(DECORATOR_CONFIGURATION));
        let configuration =
            DecoratorConfiguration::new("person").with_decorator(DecoratorParameters::new("readonly"));
        store.save(&configuration).await.unwrap();
        store
    }

    fn upgrade_service(database: &JournalDatabase, version: Option<u32>) -> (UpgradeService, Arc<InMemoryVersionStore>) {
        let version_store = Arc::new(InMemoryVersionStore::new(version));
        let mut service = UpgradeService::new(Arc::new(database.clone()), version_store.clone());
        for step in builtin_steps(255) {
            service.add_upgrade(step).unwrap();
        }
        (service, version_store)
    }

    #[tokio::test]
    async fn test_bootstrap_enables_decoration() {
        let database = JournalDatabase::new();
        let (service, version_store) = upgrade_service(&database, Some(46));
        let bootstrapper = Bootstrapper::new(MolgenisConfig::default(), store_with_readonly_person().await)
            .with_upgrade_service(service)
            .with_factory(TaggingDecoratorFactory::new("tag"));

        let repository = person_repository();
        let before = bootstrapper.registry().decorate(repository.clone()).await.unwrap();
        assert!(Arc::ptr_eq(&before, &repository));

        let report = bootstrapper.bootstrap().await.unwrap();
        assert_eq!(report.factory_ids, vec!["audit", "readonly", "required", "tag"]);
        assert_eq!(report.upgrade.unwrap().applied.len(), 1);
        assert_eq!(version_store.read_version().await.unwrap(), Some(47));
        assert!(bootstrapper.state().is_bootstrapped());

        let decorated = bootstrapper.registry().decorate(repository).await.unwrap();
        assert_eq!(decorated.decorator_ids(), vec!["readonly"]);
        let err = decorated.add(entity(json!({"id": "1"}))).await.unwrap_err();
        assert!(matches!(err, Error::ReadOnly(_)));

        assert!(bootstrapper.bootstrap().await.is_err());
    }

    #[tokio::test]
    async fn test_failed_upgrade_never_finishes_bootstrapping() {
        let database = JournalDatabase::new();
        database.fail_on("maxLength").await;
        let (service, version_store) = upgrade_service(&database, Some(46));
        let bootstrapper = Bootstrapper::new(MolgenisConfig::default(), store_with_readonly_person().await)
            .with_upgrade_service(service);

        let err = bootstrapper.bootstrap().await.unwrap_err();
        assert!(matches!(err, Error::Upgrade { version: 47, .. }));
        assert!(!bootstrapper.state().is_bootstrapped());
        assert!(bootstrapper.registry().factory_ids().is_empty());
        assert_eq!(version_store.read_version().await.unwrap(), Some(46));

        let repository = person_repository();
        let decorated = bootstrapper.registry().decorate(repository.clone()).await.unwrap();
        assert!(Arc::ptr_eq(&decorated, &repository));
    }

    #[tokio::test]
    async fn test_configured_exclusions_and_disabled_upgrades() {
        let database = JournalDatabase::new();
        let (service, version_store) = upgrade_service(&database, Some(46));
        let mut config = MolgenisConfig::default();
        config.upgrade.enabled = false;
        config.decorators.builtin_factories = false;
        config.decorators.excluded_entity_types = vec!["person".to_string()];

        let bootstrapper =
            Bootstrapper::new(config, store_with_readonly_person().await).with_upgrade_service(service);
        let report = bootstrapper.bootstrap().await.unwrap();

        assert!(report.upgrade.is_none());
        assert!(report.factory_ids.is_empty());
        assert_eq!(version_store.read_version().await.unwrap(), Some(46));
        assert!(database.committed_statements().await.is_empty());
        assert!(bootstrapper.registry().is_excluded("person"));
    }

    #[tokio::test]
    async fn test_duplicate_factory_aborts_bootstrapping() {
        let bootstrapper = Bootstrapper::new(MolgenisConfig::default(), store_with_readonly_person().await)
            .with_factory(TaggingDecoratorFactory::new("audit"));

        let err = bootstrapper.bootstrap().await.unwrap_err();
        assert!(matches!(err, Error::DuplicateDecoratorFactory(ref id) if id == "audit"));
        assert!(!bootstrapper.state().is_bootstrapped());
    }

    #[tokio::test]
    async fn test_store_follows_configured_entity_type() {
        let mut config = MolgenisConfig::default();
        config.decorators.configuration_entity_type = "app_DecoratorSettings".to_string();
        let store = Arc::new(RepositoryDecoratorConfigurationStore::from_config(&config.decorators));
        assert_eq!(store.entity_type_id(), "app_DecoratorSettings");

        let bootstrapper = Bootstrapper::new(config, store);
        bootstrapper.bootstrap().await.unwrap();
        assert!(bootstrapper.registry().is_excluded("app_DecoratorSettings"));
        assert!(!bootstrapper.registry().is_excluded(DECORATOR_CONFIGURATION));
    }

    #[tokio::test]
    async fn test_mismatched_configuration_entity_type_aborts_bootstrapping() {
        let mut config = MolgenisConfig::default();
        config.decorators.configuration_entity_type = "app_DecoratorSettings".to_string();
        let bootstrapper = Bootstrapper::new(config, store_with_readonly_person().await);

        let err = bootstrapper.bootstrap().await.unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("app_DecoratorSettings")));
        assert!(!bootstrapper.state().is_bootstrapped());
        assert!(bootstrapper.registry().factory_ids().is_empty());
    }

    #[test]
    fn test_default_upgrade_service() {
        let config = MolgenisConfig::default();
        let service = default_upgrade_service(&config, Arc::new(JournalDatabase::new())).unwrap();
        assert_eq!(service.latest_version(), Some(47));
    }
}
