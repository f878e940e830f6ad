//! Dynamic repository decorator registry

use scc::{HashMap as SccHashMap, HashSet as SccHashSet};
use std::sync::Arc;

use super::factory::DynamicRepositoryDecoratorFactory;
use super::store::DecoratorConfigurationStore;
use crate::data::Repository;
use crate::lifecycle::BootstrapState;
use crate::{Error, Result};

/// Holds decorator factories and decorates repositories per stored configuration
///
/// Decoration is a no-op until bootstrapping has finished, for excluded
/// entity types (always including the configuration store's own entity type)
/// and for entity types without a non-empty stored configuration.
pub struct DynamicRepositoryDecoratorRegistry {
    factories: SccHashMap<String, Arc<dyn DynamicRepositoryDecoratorFactory>>,
    excluded: SccHashSet<String>,
    store: Arc<dyn DecoratorConfigurationStore>,
    bootstrap: Arc<BootstrapState>,
}

impl DynamicRepositoryDecoratorRegistry {
    pub fn new(store: Arc<dyn DecoratorConfigurationStore>, bootstrap: Arc<BootstrapState>) -> Self {
        let excluded = SccHashSet::new();
        let _ = excluded.insert_sync(store.entity_type_id().to_string());
        Self {
            factories: SccHashMap::new(),
            excluded,
            store,
            bootstrap,
        }
    }

    /// Entity type id the decorator configurations are stored in
    pub fn configuration_entity_type(&self) -> &str {
        self.store.entity_type_id()
    }

    /// Registers a factory; a second factory with the same id is rejected
    pub fn add_factory(&self, factory: Arc<dyn DynamicRepositoryDecoratorFactory>) -> Result<()> {
        let id = factory.id().to_string();
        match self.factories.insert_sync(id.clone(), factory) {
            Ok(()) => {
                log::info!("Registered dynamic decorator factory '{}'", id);
                Ok(())
            }
            Err(_) => Err(Error::DuplicateDecoratorFactory(id)),
        }
    }

    pub fn get_factory(&self, id: &str) -> Result<Arc<dyn DynamicRepositoryDecoratorFactory>> {
        self.factories
            .read_sync(id, |_, factory| factory.clone())
            .ok_or_else(|| Error::UnknownDecoratorFactory(id.to_string()))
    }

    pub fn has_factory(&self, id: &str) -> bool {
        self.factories.contains_sync(id)
    }

    /// Registered factory ids, sorted
    pub fn factory_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.factories.retain_sync(|id, _| {
            ids.push(id.clone());
            true
        });
        ids.sort();
        ids
    }

    /// Permanently excludes an entity type from decoration
    pub fn exclude_entity_type(&self, entity_type_id: impl Into<String>) {
        let entity_type_id = entity_type_id.into();
        if self.excluded.insert_sync(entity_type_id.clone()).is_ok() {
            log::debug!("Excluded entity type '{}' from dynamic decoration", entity_type_id);
        }
    }

    pub fn is_excluded(&self, entity_type_id: &str) -> bool {
        self.excluded.contains_sync(entity_type_id)
    }

    /// Wraps `repository` with the decorators configured for its entity type
    ///
    /// Decorators apply in stored order, each wrapping the result of the
    /// previous one. Entries naming an unregistered factory are skipped.
    pub async fn decorate(&self, repository: Arc<dyn Repository>) -> Result<Arc<dyn Repository>> {
        let entity_type_id = repository.entity_type().id.clone();

        if self.is_excluded(&entity_type_id) {
            log::trace!("Entity type '{}' is excluded from decoration", entity_type_id);
            return Ok(repository);
        }
        if !self.bootstrap.is_bootstrapped() {
            log::trace!("Not decorating '{}' before bootstrapping finished", entity_type_id);
            return Ok(repository);
        }

        let Some(configuration) = self.store.find_by_entity_type(&entity_type_id).await? else {
            return Ok(repository);
        };

        let mut repository = repository;
        for parameters in &configuration.parameters {
            let Some(factory) = self.factories.read_sync(parameters.decorator.as_str(), |_, f| f.clone()) else {
                log::trace!(
                    "Skipping unregistered decorator '{}' for entity type '{}'",
                    parameters.decorator,
                    entity_type_id
                );
                continue;
            };
            let parsed = parameters.parsed()?;
            repository = factory.create_decorated_repository(repository, &parsed)?;
        }
        Ok(repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::meta::{DecoratorConfiguration, DecoratorParameters, DECORATOR_CONFIGURATION};
    use crate::decorator::store::RepositoryDecoratorConfigurationStore;
    use crate::testing::{person_repository, TaggingDecoratorFactory};
    use serde_json::json;

    async fn registry_with(
        configuration: Option<DecoratorConfiguration>,
        bootstrapped: bool,
    ) -> DynamicRepositoryDecoratorRegistry {
        let store = Arc::new(RepositoryDecoratorConfigurationStore::in_memory(DECORATOR_CONFIGURATION));
        if let Some(configuration) = configuration {
            store.save(&configuration).await.unwrap();
        }
        let bootstrap = Arc::new(BootstrapState::new());
        if bootstrapped {
            bootstrap.mark_bootstrapped();
        }
        DynamicRepositoryDecoratorRegistry::new(store, bootstrap)
    }

    #[tokio::test]
    async fn test_duplicate_factory_is_rejected() {
        let registry = registry_with(None, true).await;
        let first = TaggingDecoratorFactory::new("audit");
        registry.add_factory(first.clone()).unwrap();

        let err = registry.add_factory(TaggingDecoratorFactory::new("audit")).unwrap_err();
        assert!(matches!(err, Error::DuplicateDecoratorFactory(ref id) if id == "audit"));

        let retrieved = registry.get_factory("audit").unwrap();
        let expected: Arc<dyn DynamicRepositoryDecoratorFactory> = first;
        assert!(Arc::ptr_eq(&retrieved, &expected));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registration_keeps_one_factory() {
        let registry = Arc::new(registry_with(None, true).await);
        let candidates: Vec<_> = (0..16).map(|_| TaggingDecoratorFactory::new("audit")).collect();

        let handles: Vec<_> = candidates
            .iter()
            .cloned()
            .map(|factory| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.add_factory(factory) })
            })
            .collect();
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        let winners: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, result)| result.is_ok())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(winners.len(), 1);
        assert!(results
            .iter()
            .filter(|result| result.is_err())
            .all(|result| matches!(result, Err(Error::DuplicateDecoratorFactory(id)) if id == "audit")));

        let registered = registry.get_factory("audit").unwrap();
        let winner: Arc<dyn DynamicRepositoryDecoratorFactory> = candidates[winners[0]].clone();
        assert!(Arc::ptr_eq(&registered, &winner));
        assert_eq!(registry.factory_ids(), vec!["audit"]);
    }

    #[tokio::test]
    async fn test_unknown_factory_and_sorted_ids() {
        let registry = registry_with(None, true).await;
        registry.add_factory(TaggingDecoratorFactory::new("b")).unwrap();
        registry.add_factory(TaggingDecoratorFactory::new("a")).unwrap();

        assert_eq!(registry.factory_ids(), vec!["a", "b"]);
        assert!(registry.has_factory("a"));
        assert!(matches!(registry.get_factory("c"), Err(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_decorates_in_stored_order_and_skips_unknown() {
        let configuration = DecoratorConfiguration::new("person")
            .with_decorator(DecoratorParameters::new("second").with_parameters(r#"{"x": 1}"#))
            .with_decorator(DecoratorParameters::new("unregistered"))
            .with_decorator(DecoratorParameters::new("first"));
        let registry = registry_with(Some(configuration), true).await;
        let first = TaggingDecoratorFactory::new("first");
        let second = TaggingDecoratorFactory::new("second");
        registry.add_factory(first.clone()).unwrap();
        registry.add_factory(second.clone()).unwrap();

        let decorated = registry.decorate(person_repository()).await.unwrap();
        assert_eq!(decorated.decorator_ids(), vec!["second", "first"]);
        assert_eq!(second.seen_parameters()[0]["x"], json!(1));
        assert!(first.seen_parameters()[0].is_empty());
    }

    #[tokio::test]
    async fn test_no_decoration_before_bootstrap() {
        let configuration =
            DecoratorConfiguration::new("person").with_decorator(DecoratorParameters::new("tag"));
        let registry = registry_with(Some(configuration), false).await;
        registry.add_factory(TaggingDecoratorFactory::new("tag")).unwrap();

        let repository = person_repository();
        let decorated = registry.decorate(repository.clone()).await.unwrap();
        assert!(Arc::ptr_eq(&decorated, &repository));
    }

    #[tokio::test]
    async fn test_excluded_and_unconfigured_entity_types_are_unchanged() {
        let configuration = DecoratorConfiguration::new("person");
        let registry = registry_with(Some(configuration), true).await;
        registry.add_factory(TaggingDecoratorFactory::new("tag")).unwrap();

        // Empty configuration
        let repository = person_repository();
        assert!(Arc::ptr_eq(&registry.decorate(repository.clone()).await.unwrap(), &repository));

        assert!(registry.is_excluded(DECORATOR_CONFIGURATION));
        registry.exclude_entity_type("person");
        assert!(registry.is_excluded("person"));
        assert!(Arc::ptr_eq(&registry.decorate(repository.clone()).await.unwrap(), &repository));
    }
}
