//! Access to stored decorator configurations

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::meta::{DecoratorConfiguration, ENTITY_TYPE_ID};
use crate::config::DecoratorsConfig;
use crate::data::{InMemoryRepository, Repository};
use crate::Result;

/// Source of decorator configurations, read on every decoration request
#[async_trait]
pub trait DecoratorConfigurationStore: Send + Sync {
    /// Entity type id of the stored configurations themselves
    fn entity_type_id(&self) -> &str;

    async fn find_by_entity_type(&self, entity_type_id: &str) -> Result<Option<DecoratorConfiguration>>;
}

/// Reads decorator configurations through a generic repository
pub struct RepositoryDecoratorConfigurationStore {
    repository: Arc<dyn Repository>,
}

impl RepositoryDecoratorConfigurationStore {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Store backed by an empty in-memory repository of the given entity type id
    pub fn in_memory(entity_type_id: &str) -> Self {
        let entity_type = super::meta::decorator_configuration_entity_type(entity_type_id);
        Self::new(Arc::new(InMemoryRepository::new(entity_type)))
    }

    /// In-memory store for the configured configuration entity type
    pub fn from_config(config: &DecoratorsConfig) -> Self {
        Self::in_memory(&config.configuration_entity_type)
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repository
    }

    /// Adds the configuration, or replaces the one stored for the same entity type
    pub async fn save(&self, configuration: &DecoratorConfiguration) -> Result<()> {
        let existing = self
            .repository
            .find_one_by(ENTITY_TYPE_ID, &Value::String(configuration.entity_type_id.clone()))
            .await?;
        match existing {
            Some(existing) => {
                let mut replacement = configuration.clone();
                replacement.id = DecoratorConfiguration::from_entity(&existing)?.id;
                self.repository.update(replacement.to_entity()).await
            }
            None => self.repository.add(configuration.to_entity()).await,
        }
    }
}

#[async_trait]
impl DecoratorConfigurationStore for RepositoryDecoratorConfigurationStore {
    fn entity_type_id(&self) -> &str {
        &self.repository.entity_type().id
    }

    async fn find_by_entity_type(&self, entity_type_id: &str) -> Result<Option<DecoratorConfiguration>> {
        let entity = self
            .repository
            .find_one_by(ENTITY_TYPE_ID, &Value::String(entity_type_id.to_string()))
            .await?;
        entity.as_ref().map(DecoratorConfiguration::from_entity).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::meta::{DecoratorParameters, DECORATOR_CONFIGURATION};

    #[tokio::test]
    async fn test_save_and_find() {
        let store = RepositoryDecoratorConfigurationStore::in_memory(DECORATOR_CONFIGURATION);
        assert_eq!(store.entity_type_id(), DECORATOR_CONFIGURATION);
        assert!(store.find_by_entity_type("person").await.unwrap().is_none());

        let config = DecoratorConfiguration::new("person").with_decorator(DecoratorParameters::new("audit"));
        store.save(&config).await.unwrap();
        assert_eq!(store.find_by_entity_type("person").await.unwrap(), Some(config.clone()));

        // Saving again replaces, keeping the stored id
        let replacement = DecoratorConfiguration::new("person").with_decorator(DecoratorParameters::new("readonly"));
        store.save(&replacement).await.unwrap();
        let found = store.find_by_entity_type("person").await.unwrap().unwrap();
        assert_eq!(found.id, config.id);
        assert_eq!(found.decorator_ids().collect::<Vec<_>>(), vec!["readonly"]);
        assert_eq!(store.repository().count().await.unwrap(), 1);
    }
}
