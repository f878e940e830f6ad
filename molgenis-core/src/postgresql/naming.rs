//! PostgreSQL identifier naming

use crate::meta::{Attribute, EntityType};

/// Order column of a junction table
pub const JUNCTION_ORDER_COLUMN: &str = "order";

/// Double quotes an identifier, escaping embedded quotes
pub fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

pub fn table_name(entity_type: &EntityType) -> String {
    quote(&entity_type.id)
}

pub fn column_name(attr: &Attribute) -> String {
    quote(&attr.name)
}

pub fn unique_key_name(entity_type: &EntityType, attr: &Attribute) -> String {
    constraint_name(entity_type, attr, "key")
}

pub fn foreign_key_name(entity_type: &EntityType, attr: &Attribute) -> String {
    constraint_name(entity_type, attr, "fkey")
}

pub fn primary_key_name(entity_type: &EntityType, attr: &Attribute) -> String {
    constraint_name(entity_type, attr, "pkey")
}

pub fn check_constraint_name(entity_type: &EntityType, attr: &Attribute) -> String {
    constraint_name(entity_type, attr, "chk")
}

/// Table holding the values of a multi-valued reference
pub fn junction_table_name(entity_type: &EntityType, attr: &Attribute) -> String {
    quote(&format!("{}_{}", entity_type.id, attr.name))
}

/// Order column kept on the referenced table of a one-to-many relation
pub fn order_column_name(mapped_by: &Attribute) -> String {
    quote(&format!("{}_order", mapped_by.name))
}

fn constraint_name(entity_type: &EntityType, attr: &Attribute, suffix: &str) -> String {
    quote(&format!("{}_{}_{}", entity_type.id, attr.name, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::AttributeType;

    #[test]
    fn test_constraint_names() {
        let entity = EntityType::new("entity");
        let attr = Attribute::new("attr", AttributeType::String);
        assert_eq!(unique_key_name(&entity, &attr), "\"entity_attr_key\"");
        assert_eq!(foreign_key_name(&entity, &attr), "\"entity_attr_fkey\"");
        assert_eq!(primary_key_name(&entity, &attr), "\"entity_attr_pkey\"");
        assert_eq!(check_constraint_name(&entity, &attr), "\"entity_attr_chk\"");
        assert_eq!(junction_table_name(&entity, &attr), "\"entity_attr\"");
        assert_eq!(order_column_name(&attr), "\"attr_order\"");
    }

    #[test]
    fn test_quote_escapes_embedded_quotes() {
        assert_eq!(quote("we\"ird"), "\"we\"\"ird\"");
    }
}
