//! Attribute type to PostgreSQL column type mapping

use crate::meta::{Attribute, AttributeType, EntityType};
use crate::{Error, Result};

/// Default length of `character varying` columns without an explicit max length
pub const DEFAULT_STRING_LENGTH: u32 = 255;

/// Column type of a column-backed attribute
///
/// Single references take the column type of the referenced entity's id
/// attribute. COMPOUND and multi-valued references have no column.
pub fn column_type(attr: &Attribute, default_string_length: u32) -> Result<String> {
    let sql_type = match attr.data_type {
        AttributeType::Bool => "boolean".to_string(),
        AttributeType::Date => "date".to_string(),
        AttributeType::DateTime => "timestamp with time zone".to_string(),
        AttributeType::Decimal => "double precision".to_string(),
        AttributeType::Int => "integer".to_string(),
        AttributeType::Long => "bigint".to_string(),
        AttributeType::Email
        | AttributeType::Enum
        | AttributeType::Hyperlink
        | AttributeType::String => format!(
            "character varying({})",
            attr.max_length.unwrap_or(default_string_length)
        ),
        AttributeType::Html | AttributeType::Script | AttributeType::Text => "text".to_string(),
        AttributeType::Categorical | AttributeType::File | AttributeType::Xref => {
            let ref_id_attr = ref_id_attribute(attr)?;
            column_type(ref_id_attr, default_string_length)?
        }
        AttributeType::CategoricalMref
        | AttributeType::Compound
        | AttributeType::Mref
        | AttributeType::OneToMany => {
            return Err(Error::DataValidation(format!(
                "Attribute [{}] of type [{}] has no column type",
                attr.name, attr.data_type
            )))
        }
    };
    Ok(sql_type)
}

/// Referenced entity type of a reference attribute
pub fn ref_entity(attr: &Attribute) -> Result<&EntityType> {
    attr.ref_entity.as_deref().ok_or_else(|| {
        Error::DataValidation(format!(
            "Attribute [{}] of type [{}] is missing a referenced entity type",
            attr.name, attr.data_type
        ))
    })
}

/// Id attribute of the entity type referenced by `attr`
pub fn ref_id_attribute(attr: &Attribute) -> Result<&Attribute> {
    let ref_entity = ref_entity(attr)?;
    ref_entity.id_attribute().ok_or_else(|| {
        Error::DataValidation(format!(
            "Referenced entity type [{}] of attribute [{}] has no id attribute",
            ref_entity.id, attr.name
        ))
    })
}
