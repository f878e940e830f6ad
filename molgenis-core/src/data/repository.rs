//! Repository abstraction

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::meta::EntityType;
use crate::Result;

/// A stored record: attribute name to value
pub type Entity = serde_json::Map<String, Value>;

/// Storage-access object for the entities of one entity type
#[async_trait]
pub trait Repository: Send + Sync {
    fn entity_type(&self) -> &Arc<EntityType>;

    /// Ids of the decorators wrapping this repository, innermost first
    fn decorator_ids(&self) -> Vec<String> {
        Vec::new()
    }

    async fn count(&self) -> Result<usize>;

    async fn find_all(&self) -> Result<Vec<Entity>>;

    async fn find_one_by_id(&self, id: &Value) -> Result<Option<Entity>>;

    /// First entity whose `field` equals `value`
    async fn find_one_by(&self, field: &str, value: &Value) -> Result<Option<Entity>>;

    async fn add(&self, entity: Entity) -> Result<()>;

    async fn update(&self, entity: Entity) -> Result<()>;

    async fn delete_by_id(&self, id: &Value) -> Result<()>;
}

/// Renders an id value for messages, without quotes around strings
pub fn id_to_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
