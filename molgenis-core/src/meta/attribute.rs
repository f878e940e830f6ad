//! Attribute definitions

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{AttributeType, EntityType};

/// A typed field of an entity type, analogous to a column or a relation
///
/// Attributes are immutable values: a schema edit produces a new `Attribute`
/// which is diffed against the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Name, unique within the owning entity type
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub data_type: AttributeType,
    pub nillable: bool,
    pub unique: bool,
    /// Computed-attribute formula; computed attributes have no column
    pub expression: Option<String>,
    /// Referenced entity type for reference types
    pub ref_entity: Option<Arc<EntityType>>,
    /// Owning side of a bidirectional one-to-many: the XREF in the referenced entity
    pub mapped_by: Option<Arc<Attribute>>,
    /// Name of the ONE_TO_MANY attribute that maps this XREF
    pub inversed_by: Option<String>,
    /// Maximum length for string-like types
    pub max_length: Option<u32>,
    /// Allowed values for ENUM attributes
    pub enum_options: Vec<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, data_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            data_type,
            nillable: true,
            unique: false,
            expression: None,
            ref_entity: None,
            mapped_by: None,
            inversed_by: None,
            max_length: None,
            enum_options: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_data_type(mut self, data_type: AttributeType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_nillable(mut self, nillable: bool) -> Self {
        self.nillable = nillable;
        self
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub fn without_expression(mut self) -> Self {
        self.expression = None;
        self
    }

    pub fn with_ref_entity(mut self, ref_entity: Arc<EntityType>) -> Self {
        self.ref_entity = Some(ref_entity);
        self
    }

    pub fn with_mapped_by(mut self, mapped_by: Arc<Attribute>) -> Self {
        self.mapped_by = Some(mapped_by);
        self
    }

    pub fn with_inversed_by(mut self, inversed_by: impl Into<String>) -> Self {
        self.inversed_by = Some(inversed_by.into());
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_enum_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_expression(&self) -> bool {
        self.expression.is_some()
    }

    pub fn is_mapped_by(&self) -> bool {
        self.mapped_by.is_some()
    }

    pub fn is_inversed_by(&self) -> bool {
        self.inversed_by.is_some()
    }

    /// Id of the referenced entity type, if any
    pub fn ref_entity_id(&self) -> Option<&str> {
        self.ref_entity.as_deref().map(|ref_entity| ref_entity.id.as_str())
    }

    /// Whether this attribute is backed by a column in its entity's table
    pub fn is_column(&self) -> bool {
        !self.has_expression()
            && self.data_type != AttributeType::Compound
            && !self.data_type.is_multiple_reference()
    }
}
