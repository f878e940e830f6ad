//! Attribute data types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Data type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributeType {
    Bool,
    Categorical,
    CategoricalMref,
    Compound,
    Date,
    DateTime,
    Decimal,
    Email,
    Enum,
    File,
    Html,
    Hyperlink,
    Int,
    Long,
    Mref,
    OneToMany,
    Script,
    #[default]
    String,
    Text,
    Xref,
}

impl AttributeType {
    /// Upper-case name as stored in metadata and printed in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::Bool => "BOOL",
            AttributeType::Categorical => "CATEGORICAL",
            AttributeType::CategoricalMref => "CATEGORICAL_MREF",
            AttributeType::Compound => "COMPOUND",
            AttributeType::Date => "DATE",
            AttributeType::DateTime => "DATE_TIME",
            AttributeType::Decimal => "DECIMAL",
            AttributeType::Email => "EMAIL",
            AttributeType::Enum => "ENUM",
            AttributeType::File => "FILE",
            AttributeType::Html => "HTML",
            AttributeType::Hyperlink => "HYPERLINK",
            AttributeType::Int => "INT",
            AttributeType::Long => "LONG",
            AttributeType::Mref => "MREF",
            AttributeType::OneToMany => "ONE_TO_MANY",
            AttributeType::Script => "SCRIPT",
            AttributeType::String => "STRING",
            AttributeType::Text => "TEXT",
            AttributeType::Xref => "XREF",
        }
    }

    /// XREF, CATEGORICAL and FILE: one referenced entity stored in a column
    pub fn is_single_reference(&self) -> bool {
        matches!(self, AttributeType::Xref | AttributeType::Categorical | AttributeType::File)
    }

    /// MREF, CATEGORICAL_MREF and ONE_TO_MANY: many referenced entities
    pub fn is_multiple_reference(&self) -> bool {
        matches!(
            self,
            AttributeType::Mref | AttributeType::CategoricalMref | AttributeType::OneToMany
        )
    }

    pub fn is_reference(&self) -> bool {
        self.is_single_reference() || self.is_multiple_reference()
    }

    /// Multiple reference types persisted in a junction table
    pub fn is_junction_table_type(&self) -> bool {
        matches!(self, AttributeType::Mref | AttributeType::CategoricalMref)
    }

    /// Types rendered as a sized character varying column
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            AttributeType::String
                | AttributeType::Email
                | AttributeType::Hyperlink
                | AttributeType::Enum
        )
    }

    pub fn is_text_like(&self) -> bool {
        matches!(self, AttributeType::Text | AttributeType::Html | AttributeType::Script)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_classification() {
        assert!(AttributeType::Xref.is_single_reference());
        assert!(AttributeType::Categorical.is_single_reference());
        assert!(!AttributeType::Mref.is_single_reference());
        assert!(AttributeType::OneToMany.is_multiple_reference());
        assert!(AttributeType::CategoricalMref.is_junction_table_type());
        assert!(!AttributeType::OneToMany.is_junction_table_type());
        assert!(!AttributeType::String.is_reference());
    }

    #[test]
    fn test_serialized_name_matches_display() {
        let json = serde_json::to_string(&AttributeType::CategoricalMref).unwrap();
        assert_eq!(json, "\"CATEGORICAL_MREF\"");
        assert_eq!(AttributeType::CategoricalMref.to_string(), "CATEGORICAL_MREF");
        assert_eq!(AttributeType::DateTime.to_string(), "DATE_TIME");
    }
}
