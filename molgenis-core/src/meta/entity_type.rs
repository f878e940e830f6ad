//! Entity type definitions

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::Attribute;

pub const DEFAULT_BACKEND: &str = crate::postgresql::POSTGRESQL;

/// A dynamically defined schema for a kind of record, analogous to a table
///
/// Entity types form a single-inheritance tree through `extends`. Abstract
/// entity types never own a table; their attributes are materialized in the
/// tables of their concrete descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityType {
    /// Fully qualified id, unique within the metadata namespace
    pub id: String,
    pub label: Option<String>,
    pub backend: String,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    pub extends: Option<Arc<EntityType>>,
    /// Own attributes in declaration order
    pub attributes: Vec<Attribute>,
    /// Name of the id attribute, own or inherited
    pub id_attribute: Option<String>,
}

impl EntityType {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            backend: DEFAULT_BACKEND.to_string(),
            is_abstract: false,
            extends: None,
            attributes: Vec::new(),
            id_attribute: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_extends(mut self, parent: Arc<EntityType>) -> Self {
        self.extends = Some(parent);
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_id_attribute(mut self, name: impl Into<String>) -> Self {
        self.id_attribute = Some(name.into());
        self
    }

    /// Finds an attribute by name in this entity type or any of its ancestors
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .or_else(|| self.extends.as_deref().and_then(|parent| parent.attribute(name)))
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// All attributes, ancestors' attributes first
    pub fn all_attributes(&self) -> Vec<&Attribute> {
        let mut attributes = match self.extends.as_deref() {
            Some(parent) => parent.all_attributes(),
            None => Vec::new(),
        };
        attributes.extend(self.attributes.iter());
        attributes
    }

    /// Resolves the id attribute through the inheritance chain
    pub fn id_attribute(&self) -> Option<&Attribute> {
        self.id_attribute_name().and_then(|name| self.attribute(name))
    }

    /// Name of the id attribute, resolved through the inheritance chain
    pub fn id_attribute_name(&self) -> Option<&str> {
        match &self.id_attribute {
            Some(name) => Some(name.as_str()),
            None => self.extends.as_deref().and_then(EntityType::id_attribute_name),
        }
    }

    /// Whether `attribute` is this entity type's id attribute
    ///
    /// Identity is by name: a changed definition of the id attribute still
    /// counts as the id attribute.
    pub fn is_id_attribute(&self, attribute: &Attribute) -> bool {
        self.id_attribute_name() == Some(attribute.name.as_str())
    }

    /// Chain of ancestors, nearest first
    pub fn ancestors(&self) -> Vec<&EntityType> {
        let mut ancestors = Vec::new();
        let mut current = self.extends.as_deref();
        while let Some(parent) = current {
            ancestors.push(parent);
            current = parent.extends.as_deref();
        }
        ancestors
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}
