//! Metadata query seam and the in-process entity type registry

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::EntityType;
use crate::{Error, Result};

/// Metadata queries needed to propagate schema changes through inheritance
#[async_trait]
pub trait EntityTypeQuery: Send + Sync {
    /// Direct children of `entity_type`, in stable registration order
    async fn find_entity_types_extending(
        &self,
        entity_type: &EntityType,
    ) -> Result<Vec<Arc<EntityType>>>;
}

/// Ordered, async-safe store of entity types
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entity_types: RwLock<Vec<Arc<EntityType>>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity type, replacing an existing one with the same id in place
    pub async fn register(&self, entity_type: Arc<EntityType>) {
        let mut entity_types = self.entity_types.write().await;
        match entity_types.iter_mut().find(|existing| existing.id == entity_type.id) {
            Some(existing) => *existing = entity_type,
            None => {
                log::debug!("Registered entity type '{}'", entity_type.id);
                entity_types.push(entity_type);
            }
        }
    }

    pub async fn get(&self, id: &str) -> Option<Arc<EntityType>> {
        self.entity_types.read().await.iter().find(|e| e.id == id).cloned()
    }

    /// Looks up an entity type, failing when it is not registered
    pub async fn require(&self, id: &str) -> Result<Arc<EntityType>> {
        self.get(id)
            .await
            .ok_or_else(|| Error::DataValidation(format!("Unknown entity type [{}]", id)))
    }

    /// Removes an entity type; children keep their own copy of the parent
    pub async fn remove(&self, id: &str) -> Option<Arc<EntityType>> {
        let mut entity_types = self.entity_types.write().await;
        let index = entity_types.iter().position(|e| e.id == id)?;
        Some(entity_types.remove(index))
    }

    pub async fn entity_types(&self) -> Vec<Arc<EntityType>> {
        self.entity_types.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entity_types.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entity_types.read().await.is_empty()
    }
}

#[async_trait]
impl EntityTypeQuery for MetadataRegistry {
    async fn find_entity_types_extending(
        &self,
        entity_type: &EntityType,
    ) -> Result<Vec<Arc<EntityType>>> {
        let entity_types = self.entity_types.read().await;
        Ok(entity_types
            .iter()
            .filter(|candidate| {
                candidate.extends.as_deref().is_some_and(|parent| parent.id == entity_type.id)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_extending_preserves_registration_order() {
        let registry = MetadataRegistry::new();
        let root = Arc::new(EntityType::new("root").with_abstract(true));
        registry.register(root.clone()).await;
        registry.register(Arc::new(EntityType::new("b").with_extends(root.clone()))).await;
        registry.register(Arc::new(EntityType::new("unrelated"))).await;
        registry.register(Arc::new(EntityType::new("a").with_extends(root.clone()))).await;

        let children = registry.find_entity_types_extending(&root).await.unwrap();
        let ids: Vec<&str> = children.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_register_replaces_in_place() {
        let registry = MetadataRegistry::new();
        registry.register(Arc::new(EntityType::new("first"))).await;
        registry.register(Arc::new(EntityType::new("second"))).await;
        registry.register(Arc::new(EntityType::new("first").with_label("First"))).await;

        let all = registry.entity_types().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].label.as_deref(), Some("First"));
        assert!(registry.require("missing").await.is_err());
        assert!(registry.remove("second").await.is_some());
        assert_eq!(registry.len().await, 1);
    }
}
