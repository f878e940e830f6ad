//! Ordered in-process repository

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::repository::{id_to_string, Entity, Repository};
use crate::meta::EntityType;
use crate::{Error, Result};

/// Keeps entities in insertion order, keyed by the entity type's id attribute
pub struct InMemoryRepository {
    entity_type: Arc<EntityType>,
    entities: RwLock<Vec<Entity>>,
}

impl InMemoryRepository {
    pub fn new(entity_type: Arc<EntityType>) -> Self {
        Self {
            entity_type,
            entities: RwLock::new(Vec::new()),
        }
    }

    fn id_attribute_name(&self) -> Result<&str> {
        self.entity_type.id_attribute_name().ok_or_else(|| {
            Error::DataValidation(format!("Entity type [{}] has no id attribute", self.entity_type.id))
        })
    }

    fn id_of<'a>(&self, entity: &'a Entity) -> Result<&'a Value> {
        let id_attr = self.id_attribute_name()?;
        match entity.get(id_attr) {
            Some(id) if !id.is_null() => Ok(id),
            _ => Err(Error::DataValidation(format!(
                "Entity of type [{}] is missing id attribute [{}]",
                self.entity_type.id, id_attr
            ))),
        }
    }

    fn unknown_entity(&self, id: &Value) -> Error {
        Error::UnknownEntity {
            entity_type: self.entity_type.id.clone(),
            id: id_to_string(id),
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entities.read().await.len())
    }

    async fn find_all(&self) -> Result<Vec<Entity>> {
        Ok(self.entities.read().await.clone())
    }

    async fn find_one_by_id(&self, id: &Value) -> Result<Option<Entity>> {
        let id_attr = self.id_attribute_name()?;
        self.find_one_by(id_attr, id).await
    }

    async fn find_one_by(&self, field: &str, value: &Value) -> Result<Option<Entity>> {
        let entities = self.entities.read().await;
        Ok(entities.iter().find(|entity| entity.get(field) == Some(value)).cloned())
    }

    async fn add(&self, entity: Entity) -> Result<()> {
        let id = self.id_of(&entity)?.clone();
        let id_attr = self.id_attribute_name()?;
        let mut entities = self.entities.write().await;
        if entities.iter().any(|existing| existing.get(id_attr) == Some(&id)) {
            return Err(Error::DataValidation(format!(
                "Duplicate value [{}] for unique id attribute [{}] of entity type [{}]",
                id_to_string(&id),
                id_attr,
                self.entity_type.id
            )));
        }
        entities.push(entity);
        Ok(())
    }

    async fn update(&self, entity: Entity) -> Result<()> {
        let id = self.id_of(&entity)?.clone();
        let id_attr = self.id_attribute_name()?;
        let mut entities = self.entities.write().await;
        match entities.iter_mut().find(|existing| existing.get(id_attr) == Some(&id)) {
            Some(existing) => {
                *existing = entity;
                Ok(())
            }
            None => Err(self.unknown_entity(&id)),
        }
    }

    async fn delete_by_id(&self, id: &Value) -> Result<()> {
        let id_attr = self.id_attribute_name()?;
        let mut entities = self.entities.write().await;
        let index = entities
            .iter()
            .position(|existing| existing.get(id_attr) == Some(id))
            .ok_or_else(|| self.unknown_entity(id))?;
        entities.remove(index);
        Ok(())
    }
}
