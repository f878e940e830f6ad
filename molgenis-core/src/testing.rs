//! Test fixtures shared by the unit tests

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::data::{Entity, InMemoryRepository, Repository};
use crate::decorator::{DecoratorParameterMap, DynamicRepositoryDecoratorFactory};
use crate::meta::{Attribute, AttributeType, EntityType};
use crate::Result;

/// Converts a JSON object literal into an entity
pub fn entity(value: Value) -> Entity {
    value.as_object().cloned().unwrap_or_default()
}

pub fn person_type() -> Arc<EntityType> {
    Arc::new(
        EntityType::new("person")
            .with_attribute(Attribute::new("id", AttributeType::String).with_nillable(false))
            .with_attribute(Attribute::new("name", AttributeType::String))
            .with_id_attribute("id"),
    )
}

pub fn person_repository() -> Arc<dyn Repository> {
    Arc::new(InMemoryRepository::new(person_type()))
}

/// Factory whose decorator only adds its id to the chain and remembers the
/// parameters it was created with
pub struct TaggingDecoratorFactory {
    id: String,
    seen_parameters: Mutex<Vec<DecoratorParameterMap>>,
}

impl TaggingDecoratorFactory {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            seen_parameters: Mutex::new(Vec::new()),
        })
    }

    pub fn seen_parameters(&self) -> Vec<DecoratorParameterMap> {
        self.seen_parameters.lock().unwrap().clone()
    }
}

impl DynamicRepositoryDecoratorFactory for TaggingDecoratorFactory {
    fn id(&self) -> &str {
        &self.id
    }

    fn create_decorated_repository(
        &self,
        repository: Arc<dyn Repository>,
        parameters: &DecoratorParameterMap,
    ) -> Result<Arc<dyn Repository>> {
        self.seen_parameters.lock().unwrap().push(parameters.clone());
        Ok(Arc::new(TaggedRepository {
            tag: self.id.clone(),
            delegate: repository,
        }))
    }
}

struct TaggedRepository {
    tag: String,
    delegate: Arc<dyn Repository>,
}

#[async_trait]
impl Repository for TaggedRepository {
    fn entity_type(&self) -> &Arc<EntityType> {
        self.delegate.entity_type()
    }

    fn decorator_ids(&self) -> Vec<String> {
        let mut ids = self.delegate.decorator_ids();
        ids.push(self.tag.clone());
        ids
    }

    async fn count(&self) -> Result<usize> {
        self.delegate.count().await
    }

    async fn find_all(&self) -> Result<Vec<Entity>> {
        self.delegate.find_all().await
    }

    async fn find_one_by_id(&self, id: &Value) -> Result<Option<Entity>> {
        self.delegate.find_one_by_id(id).await
    }

    async fn find_one_by(&self, field: &str, value: &Value) -> Result<Option<Entity>> {
        self.delegate.find_one_by(field, value).await
    }

    async fn add(&self, entity: Entity) -> Result<()> {
        self.delegate.add(entity).await
    }

    async fn update(&self, entity: Entity) -> Result<()> {
        self.delegate.update(entity).await
    }

    async fn delete_by_id(&self, id: &Value) -> Result<()> {
        self.delegate.delete_by_id(id).await
    }
}
