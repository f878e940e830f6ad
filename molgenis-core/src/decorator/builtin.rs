//! Built-in decorator factories: `audit`, `readonly` and `required`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::factory::DynamicRepositoryDecoratorFactory;
use super::meta::DecoratorParameterMap;
use crate::data::{id_to_string, Entity, Repository};
use crate::meta::EntityType;
use crate::{Error, Result};

pub const AUDIT: &str = "audit";
pub const READONLY: &str = "readonly";
pub const REQUIRED: &str = "required";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOperation {
    Add,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub entity_type_id: String,
    pub entity_id: String,
    pub operation: AuditOperation,
    pub timestamp: DateTime<Utc>,
}

/// Shared, append-only record of audited writes
#[derive(Debug, Default)]
pub struct AuditTrail {
    records: Mutex<Vec<AuditRecord>>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, record: AuditRecord) {
        self.records.lock().await.push(record);
    }

    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

/// Records every write to an [`AuditTrail`] and logs it
///
/// Parameter `level`: log level of the audit messages, default `info`.
pub struct AuditDecoratorFactory {
    trail: Arc<AuditTrail>,
}

impl AuditDecoratorFactory {
    pub fn new(trail: Arc<AuditTrail>) -> Self {
        Self { trail }
    }

    pub fn trail(&self) -> &Arc<AuditTrail> {
        &self.trail
    }
}

impl DynamicRepositoryDecoratorFactory for AuditDecoratorFactory {
    fn id(&self) -> &str {
        AUDIT
    }

    fn label(&self) -> &str {
        "Audit"
    }

    fn description(&self) -> &str {
        "Records every add, update and delete"
    }

    fn schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "level": { "type": "string", "enum": ["error", "warn", "info", "debug", "trace"] }
            }
        }))
    }

    fn create_decorated_repository(
        &self,
        repository: Arc<dyn Repository>,
        parameters: &DecoratorParameterMap,
    ) -> Result<Arc<dyn Repository>> {
        let level = match parameters.get("level") {
            None | Some(Value::Null) => log::Level::Info,
            Some(Value::String(level)) => log::Level::from_str(level)
                .map_err(|_| Error::DataValidation(format!("Invalid audit log level [{}]", level)))?,
            Some(other) => {
                return Err(Error::DataValidation(format!("Invalid audit log level [{}]", other)))
            }
        };
        Ok(Arc::new(AuditRepository {
            delegate: repository,
            trail: self.trail.clone(),
            level,
        }))
    }
}

struct AuditRepository {
    delegate: Arc<dyn Repository>,
    trail: Arc<AuditTrail>,
    level: log::Level,
}

impl AuditRepository {
    async fn audit(&self, operation: AuditOperation, entity_id: String) {
        let entity_type_id = self.delegate.entity_type().id.clone();
        log::log!(self.level, "Audit: {:?} [{}] of entity type [{}]", operation, entity_id, entity_type_id);
        self.trail
            .record(AuditRecord {
                entity_type_id,
                entity_id,
                operation,
                timestamp: Utc::now(),
            })
            .await;
    }

    fn entity_id(&self, entity: &Entity) -> String {
        self.delegate
            .entity_type()
            .id_attribute_name()
            .and_then(|id_attr| entity.get(id_attr))
            .map(id_to_string)
            .unwrap_or_default()
    }
}

#[async_trait]
impl Repository for AuditRepository {
    fn entity_type(&self) -> &Arc<EntityType> {
        self.delegate.entity_type()
    }

    fn decorator_ids(&self) -> Vec<String> {
        let mut ids = self.delegate.decorator_ids();
        ids.push(AUDIT.to_string());
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
        let entity_id = self.entity_id(&entity);
        self.delegate.add(entity).await?;
        self.audit(AuditOperation::Add, entity_id).await;
        Ok(())
    }

    async fn update(&self, entity: Entity) -> Result<()> {
        let entity_id = self.entity_id(&entity);
        self.delegate.update(entity).await?;
        self.audit(AuditOperation::Update, entity_id).await;
        Ok(())
    }

    async fn delete_by_id(&self, id: &Value) -> Result<()> {
        self.delegate.delete_by_id(id).await?;
        self.audit(AuditOperation::Delete, id_to_string(id)).await;
        Ok(())
    }
}

/// Rejects every write
pub struct ReadOnlyDecoratorFactory;

impl DynamicRepositoryDecoratorFactory for ReadOnlyDecoratorFactory {
    fn id(&self) -> &str {
        READONLY
    }

    fn label(&self) -> &str {
        "Read-only"
    }

    fn description(&self) -> &str {
        "Rejects adds, updates and deletes"
    }

    fn create_decorated_repository(
        &self,
        repository: Arc<dyn Repository>,
        _parameters: &DecoratorParameterMap,
    ) -> Result<Arc<dyn Repository>> {
        Ok(Arc::new(ReadOnlyRepository { delegate: repository }))
    }
}

struct ReadOnlyRepository {
    delegate: Arc<dyn Repository>,
}

impl ReadOnlyRepository {
    fn rejected(&self) -> Error {
        Error::ReadOnly(self.delegate.entity_type().id.clone())
    }
}

#[async_trait]
impl Repository for ReadOnlyRepository {
    fn entity_type(&self) -> &Arc<EntityType> {
        self.delegate.entity_type()
    }

    fn decorator_ids(&self) -> Vec<String> {
        let mut ids = self.delegate.decorator_ids();
        ids.push(READONLY.to_string());
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

    async fn add(&self, _entity: Entity) -> Result<()> {
        Err(self.rejected())
    }

    async fn update(&self, _entity: Entity) -> Result<()> {
        Err(self.rejected())
    }

    async fn delete_by_id(&self, _id: &Value) -> Result<()> {
        Err(self.rejected())
    }
}

/// Rejects adds and updates missing a value for any listed attribute
///
/// Parameter `attributes`: list of attribute names.
pub struct RequiredAttributesDecoratorFactory;

impl DynamicRepositoryDecoratorFactory for RequiredAttributesDecoratorFactory {
    fn id(&self) -> &str {
        REQUIRED
    }

    fn label(&self) -> &str {
        "Required attributes"
    }

    fn description(&self) -> &str {
        "Requires values for the listed attributes"
    }

    fn schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "attributes": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["attributes"]
        }))
    }

    fn create_decorated_repository(
        &self,
        repository: Arc<dyn Repository>,
        parameters: &DecoratorParameterMap,
    ) -> Result<Arc<dyn Repository>> {
        let invalid = || {
            Error::DataValidation(format!(
                "Decorator [{}] needs parameter [attributes] listing attribute names",
                REQUIRED
            ))
        };
        let attributes = parameters
            .get("attributes")
            .and_then(Value::as_array)
            .ok_or_else(invalid)?
            .iter()
            .map(|name| name.as_str().map(str::to_string).ok_or_else(invalid))
            .collect::<Result<Vec<_>>>()?;

        let entity_type = repository.entity_type();
        if let Some(unknown) = attributes.iter().find(|name| !entity_type.has_attribute(name)) {
            return Err(Error::UnknownAttribute {
                entity_type: entity_type.id.clone(),
                attribute: unknown.clone(),
            });
        }

        Ok(Arc::new(RequiredAttributesRepository {
            delegate: repository,
            attributes,
        }))
    }
}

struct RequiredAttributesRepository {
    delegate: Arc<dyn Repository>,
    attributes: Vec<String>,
}

impl RequiredAttributesRepository {
    fn validate(&self, entity: &Entity) -> Result<()> {
        for name in &self.attributes {
            if !matches!(entity.get(name), Some(value) if !value.is_null()) {
                return Err(Error::DataValidation(format!(
                    "Entity of type [{}] is missing required attribute [{}]",
                    self.delegate.entity_type().id,
                    name
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for RequiredAttributesRepository {
    fn entity_type(&self) -> &Arc<EntityType> {
        self.delegate.entity_type()
    }

    fn decorator_ids(&self) -> Vec<String> {
        let mut ids = self.delegate.decorator_ids();
        ids.push(REQUIRED.to_string());
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
        self.validate(&entity)?;
        self.delegate.add(entity).await
    }

    async fn update(&self, entity: Entity) -> Result<()> {
        self.validate(&entity)?;
        self.delegate.update(entity).await
    }

    async fn delete_by_id(&self, id: &Value) -> Result<()> {
        self.delegate.delete_by_id(id).await
    }
}

/// The built-in factories, sharing `trail` for auditing
pub fn builtin_factories(trail: Arc<AuditTrail>) -> Vec<Arc<dyn DynamicRepositoryDecoratorFactory>> {
    vec![
        Arc::new(AuditDecoratorFactory::new(trail)),
        Arc::new(ReadOnlyDecoratorFactory),
        Arc::new(RequiredAttributesDecoratorFactory),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{entity, person_repository};
    use serde_json::Map;

    fn params(value: Value) -> DecoratorParameterMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_audit_records_writes() {
        let trail = Arc::new(AuditTrail::new());
        let factory = AuditDecoratorFactory::new(trail.clone());
        let repo = factory
            .create_decorated_repository(person_repository(), &params(json!({ "level": "debug" })))
            .unwrap();

        repo.add(entity(json!({ "id": "1", "name": "Ada" }))).await.unwrap();
        repo.update(entity(json!({ "id": "1", "name": "Ada L." }))).await.unwrap();
        repo.delete_by_id(&json!("1")).await.unwrap();

        let operations: Vec<AuditOperation> = trail.records().await.iter().map(|r| r.operation).collect();
        assert_eq!(operations, vec![AuditOperation::Add, AuditOperation::Update, AuditOperation::Delete]);
        assert!(trail.records().await.iter().all(|r| r.entity_id == "1" && r.entity_type_id == "person"));
    }

    #[tokio::test]
    async fn test_audit_skips_failed_writes_and_rejects_bad_level() {
        let trail = Arc::new(AuditTrail::new());
        let factory = AuditDecoratorFactory::new(trail.clone());
        let repo = factory.create_decorated_repository(person_repository(), &Map::new()).unwrap();
        assert!(repo.delete_by_id(&json!("missing")).await.is_err());
        assert!(trail.is_empty().await);

        let bad = factory.create_decorated_repository(person_repository(), &params(json!({ "level": "loud" })));
        assert!(bad.is_err());
    }

    #[tokio::test]
    async fn test_readonly_rejects_writes() {
        let repo = ReadOnlyDecoratorFactory
            .create_decorated_repository(person_repository(), &Map::new())
            .unwrap();
        let err = repo.add(entity(json!({ "id": "1" }))).await.unwrap_err();
        assert_eq!(err.to_string(), "Repository [person] is read-only");
        assert!(repo.delete_by_id(&json!("1")).await.is_err());
        assert_eq!(repo.count().await.unwrap(), 0);
        assert_eq!(repo.decorator_ids(), vec![READONLY.to_string()]);
    }

    #[tokio::test]
    async fn test_required_attributes() {
        let repo = RequiredAttributesDecoratorFactory
            .create_decorated_repository(person_repository(), &params(json!({ "attributes": ["name"] })))
            .unwrap();

        let err = repo.add(entity(json!({ "id": "1", "name": null }))).await.unwrap_err();
        assert!(err.is_validation());
        repo.add(entity(json!({ "id": "1", "name": "Ada" }))).await.unwrap();
        assert!(repo.update(entity(json!({ "id": "1" }))).await.is_err());
    }

    #[test]
    fn test_required_needs_known_attribute_list() {
        let factory = RequiredAttributesDecoratorFactory;
        assert!(factory.create_decorated_repository(person_repository(), &Map::new()).is_err());
        let err = factory
            .create_decorated_repository(person_repository(), &params(json!({ "attributes": ["shoeSize"] })))
            .err()
            .unwrap();
        assert!(err.is_not_found());
    }
}
