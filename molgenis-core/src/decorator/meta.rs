//! Stored decorator configuration
//!
//! One [`DecoratorConfiguration`] per entity type lists the decorators to
//! apply, in order, each with an optional JSON parameter blob.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::data::Entity;
use crate::meta::{Attribute, AttributeType, EntityType};
use crate::{Error, Result};

/// Entity type id of stored decorator configurations
pub const DECORATOR_CONFIGURATION: &str = "sys_dec_DecoratorConfiguration";
pub const ID: &str = "id";
pub const ENTITY_TYPE_ID: &str = "entityTypeId";
pub const PARAMETERS: &str = "parameters";
pub const DECORATOR: &str = "decorator";

/// Parsed decorator parameters
pub type DecoratorParameterMap = Map<String, Value>;

/// One decorator of a configuration: the factory id and its JSON parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratorParameters {
    pub decorator: String,
    /// Raw JSON object, parsed on demand
    pub parameters: Option<String>,
}

impl DecoratorParameters {
    pub fn new(decorator: impl Into<String>) -> Self {
        Self {
            decorator: decorator.into(),
            parameters: None,
        }
    }

    pub fn with_parameters(mut self, json: impl Into<String>) -> Self {
        self.parameters = Some(json.into());
        self
    }

    /// Parses the parameter blob; absent, blank or `null` yields an empty map
    pub fn parsed(&self) -> Result<DecoratorParameterMap> {
        let Some(raw) = self.parameters.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(Map::new());
        };
        match serde_json::from_str::<Value>(raw)? {
            Value::Null => Ok(Map::new()),
            Value::Object(map) => Ok(map),
            other => Err(Error::DataValidation(format!(
                "Parameters of decorator [{}] must be a JSON object, got [{}]",
                self.decorator, other
            ))),
        }
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(DECORATOR.to_string(), Value::String(self.decorator.clone()));
        map.insert(
            PARAMETERS.to_string(),
            self.parameters.clone().map(Value::String).unwrap_or(Value::Null),
        );
        Value::Object(map)
    }

    fn from_value(value: &Value) -> Result<Self> {
        let decorator = value
            .get(DECORATOR)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::DataValidation("Decorator parameters are missing a decorator id".to_string()))?;
        let parameters = match value.get(PARAMETERS) {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => Some(raw.clone()),
            // Accept inline objects as well as serialized ones
            Some(other) => Some(other.to_string()),
        };
        Ok(Self {
            decorator: decorator.to_string(),
            parameters,
        })
    }
}

/// Ordered decorator list of one entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratorConfiguration {
    pub id: String,
    pub entity_type_id: String,
    pub parameters: Vec<DecoratorParameters>,
}

impl DecoratorConfiguration {
    pub fn new(entity_type_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            entity_type_id: entity_type_id.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_decorator(mut self, parameters: DecoratorParameters) -> Self {
        self.parameters.push(parameters);
        self
    }

    pub fn decorator_ids(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.decorator.as_str())
    }

    pub fn to_entity(&self) -> Entity {
        let mut entity = Map::new();
        entity.insert(ID.to_string(), Value::String(self.id.clone()));
        entity.insert(ENTITY_TYPE_ID.to_string(), Value::String(self.entity_type_id.clone()));
        entity.insert(
            PARAMETERS.to_string(),
            Value::Array(self.parameters.iter().map(DecoratorParameters::to_value).collect()),
        );
        entity
    }

    pub fn from_entity(entity: &Entity) -> Result<Self> {
        let field = |name: &str| {
            entity.get(name).and_then(Value::as_str).map(str::to_string).ok_or_else(|| {
                Error::DataValidation(format!("Decorator configuration is missing [{}]", name))
            })
        };
        let parameters = match entity.get(PARAMETERS) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(values)) => values
                .iter()
                .map(DecoratorParameters::from_value)
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(Error::DataValidation(
                    "Decorator configuration parameters must be a list".to_string(),
                ))
            }
        };
        Ok(Self {
            id: field(ID)?,
            entity_type_id: field(ENTITY_TYPE_ID)?,
            parameters,
        })
    }
}

/// Entity type describing stored decorator configurations
pub fn decorator_configuration_entity_type(id: &str) -> Arc<EntityType> {
    Arc::new(
        EntityType::new(id)
            .with_label("Decorator configuration")
            .with_attribute(Attribute::new(ID, AttributeType::String).with_nillable(false))
            .with_attribute(
                Attribute::new(ENTITY_TYPE_ID, AttributeType::String)
                    .with_nillable(false)
                    .with_unique(true),
            )
            .with_attribute(Attribute::new(PARAMETERS, AttributeType::Text))
            .with_id_attribute(ID),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_or_null_parameters_parse_to_empty_map() {
        assert!(DecoratorParameters::new("audit").parsed().unwrap().is_empty());
        assert!(DecoratorParameters::new("audit").with_parameters("null").parsed().unwrap().is_empty());
        assert!(DecoratorParameters::new("audit").with_parameters("  ").parsed().unwrap().is_empty());
    }

    #[test]
    fn test_parameters_parse_to_object() {
        let params = DecoratorParameters::new("audit").with_parameters(r#"{"level": "warn", "n": 3}"#);
        let parsed = params.parsed().unwrap();
        assert_eq!(parsed["level"], json!("warn"));
        assert_eq!(parsed["n"], json!(3));

        assert!(DecoratorParameters::new("x").with_parameters("[1]").parsed().is_err());
        assert!(DecoratorParameters::new("x").with_parameters("{broken").parsed().is_err());
    }

    #[test]
    fn test_entity_conversion_preserves_order() {
        let config = DecoratorConfiguration::new("person")
            .with_decorator(DecoratorParameters::new("readonly"))
            .with_decorator(DecoratorParameters::new("audit").with_parameters(r#"{"level":"info"}"#));

        let restored = DecoratorConfiguration::from_entity(&config.to_entity()).unwrap();
        assert_eq!(restored, config);
        assert_eq!(restored.decorator_ids().collect::<Vec<_>>(), vec!["readonly", "audit"]);
    }

    #[test]
    fn test_from_entity_accepts_inline_parameter_objects() {
        let entity = json!({
            "id": "c1",
            "entityTypeId": "person",
            "parameters": [{ "decorator": "required", "parameters": { "attributes": ["name"] } }]
        });
        let config = DecoratorConfiguration::from_entity(entity.as_object().unwrap()).unwrap();
        let parsed = config.parameters[0].parsed().unwrap();
        assert_eq!(parsed["attributes"], json!(["name"]));
    }
}
