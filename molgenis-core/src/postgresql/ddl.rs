//! DDL synthesis for attribute and entity type changes
//!
//! Given the old and new definition of an attribute, [`DdlSynthesizer`]
//! derives the ordered list of PostgreSQL statements that brings one concrete
//! table from the old shape to the new one. Statement order matters: a
//! foreign key is always dropped before its column is retyped and re-added
//! afterwards.
//!
//! Attributes map to storage in one of three ways:
//!
//! - a column in the entity's own table (scalars and single references)
//! - a junction table `"<entity>_<attr>"` (MREF, CATEGORICAL_MREF)
//! - an order column on the referenced table (ONE_TO_MANY mapped by an XREF)
//!
//! COMPOUND attributes and computed attributes (with an expression) are never
//! persisted.

use super::naming::{
    check_constraint_name, column_name, foreign_key_name, junction_table_name,
    order_column_name, primary_key_name, quote, table_name, unique_key_name,
    JUNCTION_ORDER_COLUMN,
};
use super::types::{column_type, ref_entity, ref_id_attribute, DEFAULT_STRING_LENGTH};
use crate::meta::{Attribute, AttributeType, EntityType};
use crate::{Error, Result};

/// Physical representation of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    None,
    Column,
    JunctionTable,
    OrderColumn,
}

fn storage_of(attr: &Attribute) -> Storage {
    if attr.has_expression() || attr.data_type == AttributeType::Compound {
        Storage::None
    } else if attr.data_type == AttributeType::OneToMany {
        Storage::OrderColumn
    } else if attr.data_type.is_junction_table_type() {
        Storage::JunctionTable
    } else {
        Storage::Column
    }
}

fn has_check_constraint(attr: &Attribute) -> bool {
    attr.data_type == AttributeType::Enum && !attr.enum_options.is_empty()
}

/// Synthesizes PostgreSQL DDL from attribute and entity type definitions
#[derive(Debug, Clone, Copy)]
pub struct DdlSynthesizer {
    default_string_length: u32,
}

impl Default for DdlSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_STRING_LENGTH)
    }
}

impl DdlSynthesizer {
    pub fn new(default_string_length: u32) -> Self {
        Self { default_string_length }
    }

    pub fn default_string_length(&self) -> u32 {
        self.default_string_length
    }

    /// Statements adding `attr` to `entity_type`
    ///
    /// Fails when the attribute already exists. Abstract entity types own no
    /// table and yield no statements.
    pub fn synthesize_add(&self, entity_type: &EntityType, attr: &Attribute) -> Result<Vec<String>> {
        ensure_absent(entity_type, attr)?;
        if entity_type.is_abstract {
            return Ok(Vec::new());
        }
        self.add_statements(entity_type, attr)
    }

    /// Statements changing `attr` into `updated` on `entity_type`
    pub fn synthesize_alter(
        &self,
        entity_type: &EntityType,
        attr: &Attribute,
        updated: &Attribute,
    ) -> Result<Vec<String>> {
        ensure_present(entity_type, attr)?;
        ensure_same_name(entity_type, attr, updated)?;
        if entity_type.is_abstract {
            return Ok(Vec::new());
        }
        self.alter_statements(entity_type, attr, updated)
    }

    /// Statements removing `attr` from `entity_type`
    pub fn synthesize_drop(&self, entity_type: &EntityType, attr: &Attribute) -> Result<Vec<String>> {
        ensure_present(entity_type, attr)?;
        if entity_type.is_abstract {
            return Ok(Vec::new());
        }
        self.drop_statements(entity_type, attr)
    }

    /// Statements creating the table of a concrete entity type and its junction tables
    ///
    /// Order columns of one-to-many attributes live on the referenced table
    /// and are added with [`DdlSynthesizer::synthesize_add`] once that table exists.
    pub fn synthesize_create_table(&self, entity_type: &EntityType) -> Result<Vec<String>> {
        if entity_type.is_abstract {
            return Ok(Vec::new());
        }
        if entity_type.id_attribute().is_none() {
            return Err(Error::DataValidation(format!(
                "Entity type [{}] has no id attribute",
                entity_type.id
            )));
        }

        let attributes = entity_type.all_attributes();
        let mut parts = Vec::new();
        for attr in attributes.iter().filter(|attr| storage_of(attr) == Storage::Column) {
            parts.push(self.column_definition(entity_type, attr)?);
        }
        for attr in attributes.iter().filter(|attr| storage_of(attr) == Storage::Column) {
            parts.extend(self.table_constraints(entity_type, attr)?);
        }

        let mut statements = vec![format!("CREATE TABLE {}({})", table_name(entity_type), parts.join(","))];
        for attr in attributes.iter().filter(|attr| storage_of(attr) == Storage::JunctionTable) {
            statements.extend(self.create_junction_table(entity_type, attr)?);
        }
        Ok(statements)
    }

    /// Statements dropping the table of a concrete entity type, junction tables first
    pub fn synthesize_drop_table(&self, entity_type: &EntityType) -> Result<Vec<String>> {
        if entity_type.is_abstract {
            return Ok(Vec::new());
        }
        let mut statements: Vec<String> = entity_type
            .all_attributes()
            .into_iter()
            .filter(|attr| storage_of(attr) == Storage::JunctionTable)
            .map(|attr| format!("DROP TABLE {}", junction_table_name(entity_type, attr)))
            .collect();
        statements.push(format!("DROP TABLE {}", table_name(entity_type)));
        Ok(statements)
    }

    pub(crate) fn add_statements(&self, entity_type: &EntityType, attr: &Attribute) -> Result<Vec<String>> {
        match storage_of(attr) {
            Storage::None => Ok(Vec::new()),
            Storage::Column => Ok(vec![self.add_column(entity_type, attr)?]),
            Storage::JunctionTable => self.create_junction_table(entity_type, attr),
            Storage::OrderColumn => {
                let (ref_table, order_column) = order_column(entity_type, attr)?;
                Ok(vec![format!("ALTER TABLE {} ADD {} SERIAL", ref_table, order_column)])
            }
        }
    }

    pub(crate) fn drop_statements(&self, entity_type: &EntityType, attr: &Attribute) -> Result<Vec<String>> {
        match storage_of(attr) {
            Storage::None => Ok(Vec::new()),
            Storage::Column => Ok(vec![drop_column(entity_type, attr)]),
            Storage::JunctionTable => Ok(vec![format!("DROP TABLE {}", junction_table_name(entity_type, attr))]),
            Storage::OrderColumn => {
                let (ref_table, order_column) = order_column(entity_type, attr)?;
                Ok(vec![format!("ALTER TABLE {} DROP COLUMN {}", ref_table, order_column)])
            }
        }
    }

    pub(crate) fn alter_statements(
        &self,
        entity_type: &EntityType,
        attr: &Attribute,
        updated: &Attribute,
    ) -> Result<Vec<String>> {
        // Computed attributes have no column
        match (attr.has_expression(), updated.has_expression()) {
            (true, false) => return self.add_statements(entity_type, updated),
            (false, true) => return self.drop_statements(entity_type, attr),
            (true, true) => return Ok(Vec::new()),
            (false, false) => {}
        }

        let was_compound = attr.data_type == AttributeType::Compound;
        let is_compound = updated.data_type == AttributeType::Compound;
        match (was_compound, is_compound) {
            (true, false) => return self.add_statements(entity_type, updated),
            (false, true) => return self.drop_statements(entity_type, attr),
            (true, true) => return Ok(Vec::new()),
            (false, false) => {}
        }

        let storage = storage_of(attr);
        if storage != storage_of(updated) {
            return Err(Error::DataValidation(format!(
                "Updating entity [{}] attribute [{}] data type from [{}] to [{}] not allowed",
                entity_type.id, attr.name, attr.data_type, updated.data_type
            )));
        }

        let mut statements = Vec::new();
        self.update_ref_entity(entity_type, attr, updated, &mut statements)?;
        self.update_data_type(entity_type, attr, updated, &mut statements)?;

        if storage == Storage::Column {
            update_nillable(entity_type, attr, updated, &mut statements)?;
            update_unique(entity_type, attr, updated, &mut statements)?;
            update_enum_options(entity_type, attr, updated, &mut statements);
        }
        Ok(statements)
    }

    fn update_ref_entity(
        &self,
        entity_type: &EntityType,
        attr: &Attribute,
        updated: &Attribute,
        statements: &mut Vec<String>,
    ) -> Result<()> {
        if !attr.data_type.is_reference() || !updated.data_type.is_reference() {
            return Ok(());
        }
        let (Some(old_ref), Some(new_ref)) = (attr.ref_entity_id(), updated.ref_entity_id()) else {
            return Ok(());
        };
        if old_ref == new_ref {
            return Ok(());
        }

        if !updated.data_type.is_single_reference() {
            return Err(Error::DataValidation(format!(
                "Updating entity [{}] attribute [{}] referenced entity from [{}] to [{}] not allowed for type [{}]",
                entity_type.id, attr.name, old_ref, new_ref, updated.data_type
            )));
        }

        statements.push(drop_constraint(entity_type, &foreign_key_name(entity_type, attr)));
        let old_type = column_type(attr, self.default_string_length)?;
        let new_type = column_type(updated, self.default_string_length)?;
        if old_type != new_type {
            statements.push(alter_column_type(entity_type, updated, &new_type));
        }
        statements.push(add_constraint(entity_type, &foreign_key_constraint(entity_type, updated)?));
        Ok(())
    }

    fn update_data_type(
        &self,
        entity_type: &EntityType,
        attr: &Attribute,
        updated: &Attribute,
        statements: &mut Vec<String>,
    ) -> Result<()> {
        // An explicit max length equal to the default leaves the column as is
        let resized = attr.data_type == updated.data_type
            && attr.data_type.is_string_like()
            && column_type(attr, self.default_string_length)? != column_type(updated, self.default_string_length)?;
        if attr.data_type == updated.data_type && !resized {
            return Ok(());
        }

        if entity_type.is_id_attribute(attr) {
            return Err(Error::DataValidation(format!(
                "Data type of entity [{}] attribute [{}] cannot be modified, because [{}] is an ID attribute.",
                entity_type.id, attr.name, attr.name
            )));
        }

        // Representation changes such as XREF to CATEGORICAL or MREF to
        // CATEGORICAL_MREF keep their storage as is
        if attr.data_type.is_single_reference() && updated.data_type.is_single_reference() {
            return Ok(());
        }
        if attr.data_type.is_multiple_reference() && updated.data_type.is_multiple_reference() {
            return Ok(());
        }

        if attr.data_type.is_single_reference() {
            statements.push(drop_constraint(entity_type, &foreign_key_name(entity_type, attr)));
        }
        let new_type = column_type(updated, self.default_string_length)?;
        statements.push(alter_column_type(entity_type, updated, &new_type));
        if updated.data_type.is_single_reference() {
            statements.push(add_constraint(entity_type, &foreign_key_constraint(entity_type, updated)?));
        }
        Ok(())
    }

    fn add_column(&self, entity_type: &EntityType, attr: &Attribute) -> Result<String> {
        let mut sql = format!(
            "ALTER TABLE {} ADD {}",
            table_name(entity_type),
            self.column_definition(entity_type, attr)?
        );
        for constraint in self.table_constraints(entity_type, attr)? {
            sql.push_str(",ADD ");
            sql.push_str(&constraint);
        }
        Ok(sql)
    }

    fn column_definition(&self, entity_type: &EntityType, attr: &Attribute) -> Result<String> {
        let mut sql = format!("{} {}", column_name(attr), column_type(attr, self.default_string_length)?);
        if !attr.nillable || entity_type.is_id_attribute(attr) {
            sql.push_str(" NOT NULL");
        }
        Ok(sql)
    }

    fn table_constraints(&self, entity_type: &EntityType, attr: &Attribute) -> Result<Vec<String>> {
        let mut constraints = Vec::new();
        if attr.data_type.is_single_reference() {
            constraints.push(foreign_key_constraint(entity_type, attr)?);
        }
        if entity_type.is_id_attribute(attr) {
            constraints.push(format!(
                "CONSTRAINT {} PRIMARY KEY ({})",
                primary_key_name(entity_type, attr),
                column_name(attr)
            ));
        } else if attr.unique {
            constraints.push(unique_constraint(entity_type, attr));
        }
        if has_check_constraint(attr) {
            constraints.push(check_constraint(entity_type, attr));
        }
        Ok(constraints)
    }

    fn create_junction_table(&self, entity_type: &EntityType, attr: &Attribute) -> Result<Vec<String>> {
        let id_attr = entity_type.id_attribute().ok_or_else(|| {
            Error::DataValidation(format!(
                "Entity type [{}] needs an id attribute to store [{}] of type [{}]",
                entity_type.id, attr.name, attr.data_type
            ))
        })?;
        let id_type = column_type(id_attr, self.default_string_length)?;
        let ref_entity = ref_entity(attr)?;
        let ref_id_attr = ref_id_attribute(attr)?;
        let ref_id_type = column_type(ref_id_attr, self.default_string_length)?;

        let junction_table = junction_table_name(entity_type, attr);
        let order = quote(JUNCTION_ORDER_COLUMN);
        let id = column_name(id_attr);
        let value = column_name(attr);

        Ok(vec![
            format!(
                "CREATE TABLE {jt} ({order} INT,{id} {id_type} NOT NULL, {value} {ref_id_type} NOT NULL, \
                 FOREIGN KEY ({id}) REFERENCES {table}({id}) ON DELETE CASCADE, \
                 FOREIGN KEY ({value}) REFERENCES {ref_table}({ref_id}) ON DELETE CASCADE, \
                 UNIQUE ({value},{id}), UNIQUE ({order},{id}))",
                jt = junction_table,
                table = table_name(entity_type),
                ref_table = table_name(ref_entity),
                ref_id = column_name(ref_id_attr),
            ),
            format!("CREATE INDEX ON {} ({})", junction_table, id),
        ])
    }
}

/// Fails with an unknown-attribute error when `attr` is not part of `entity_type`
pub(crate) fn ensure_present(entity_type: &EntityType, attr: &Attribute) -> Result<()> {
    if entity_type.has_attribute(&attr.name) {
        Ok(())
    } else {
        Err(Error::UnknownAttribute {
            entity_type: entity_type.id.clone(),
            attribute: attr.name.clone(),
        })
    }
}

pub(crate) fn ensure_absent(entity_type: &EntityType, attr: &Attribute) -> Result<()> {
    if entity_type.has_attribute(&attr.name) {
        return Err(Error::DataValidation(format!(
            "Adding attribute operation failed. Attribute already exists [{}]",
            attr.name
        )));
    }
    Ok(())
}

pub(crate) fn ensure_same_name(entity_type: &EntityType, attr: &Attribute, updated: &Attribute) -> Result<()> {
    if attr.name != updated.name {
        return Err(Error::DataValidation(format!(
            "Renaming entity [{}] attribute [{}] to [{}] not supported",
            entity_type.id, attr.name, updated.name
        )));
    }
    Ok(())
}

fn update_nillable(
    entity_type: &EntityType,
    attr: &Attribute,
    updated: &Attribute,
    statements: &mut Vec<String>,
) -> Result<()> {
    match (attr.nillable, updated.nillable) {
        (true, false) => statements.push(format!(
            "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL",
            table_name(entity_type),
            column_name(updated)
        )),
        (false, true) => {
            if entity_type.is_id_attribute(attr) {
                return Err(Error::DataValidation(format!(
                    "ID attribute [{}] of entity [{}] cannot be nillable",
                    attr.name, entity_type.id
                )));
            }
            statements.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP NOT NULL",
                table_name(entity_type),
                column_name(updated)
            ));
        }
        _ => {}
    }
    Ok(())
}

fn update_unique(
    entity_type: &EntityType,
    attr: &Attribute,
    updated: &Attribute,
    statements: &mut Vec<String>,
) -> Result<()> {
    match (attr.unique, updated.unique) {
        (true, false) => {
            if entity_type.is_id_attribute(attr) {
                return Err(Error::DataValidation(format!(
                    "ID attribute [{}] of entity [{}] must be unique",
                    attr.name, entity_type.id
                )));
            }
            statements.push(drop_constraint(entity_type, &unique_key_name(entity_type, attr)));
        }
        (false, true) => statements.push(add_constraint(entity_type, &unique_constraint(entity_type, updated))),
        _ => {}
    }
    Ok(())
}

fn update_enum_options(
    entity_type: &EntityType,
    attr: &Attribute,
    updated: &Attribute,
    statements: &mut Vec<String>,
) {
    let had_check = has_check_constraint(attr);
    let has_check = has_check_constraint(updated);
    if had_check == has_check && attr.enum_options == updated.enum_options {
        return;
    }
    if had_check {
        statements.push(drop_constraint(entity_type, &check_constraint_name(entity_type, attr)));
    }
    if has_check {
        statements.push(add_constraint(entity_type, &check_constraint(entity_type, updated)));
    }
}

fn order_column(entity_type: &EntityType, attr: &Attribute) -> Result<(String, String)> {
    let mapped_by = attr
        .mapped_by
        .as_deref()
        .filter(|mapped_by| mapped_by.is_inversed_by())
        .ok_or_else(|| {
            Error::DataValidation(format!(
                "Entity [{}] attribute [{}] of type [{}] must be mapped by an inversed reference attribute",
                entity_type.id, attr.name, attr.data_type
            ))
        })?;
    let ref_entity = ref_entity(attr)?;
    Ok((table_name(ref_entity), order_column_name(mapped_by)))
}

fn foreign_key_constraint(entity_type: &EntityType, attr: &Attribute) -> Result<String> {
    let ref_entity = ref_entity(attr)?;
    let ref_id_attr = ref_id_attribute(attr)?;
    Ok(format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
        foreign_key_name(entity_type, attr),
        column_name(attr),
        table_name(ref_entity),
        column_name(ref_id_attr)
    ))
}

fn unique_constraint(entity_type: &EntityType, attr: &Attribute) -> String {
    format!("CONSTRAINT {} UNIQUE ({})", unique_key_name(entity_type, attr), column_name(attr))
}

fn check_constraint(entity_type: &EntityType, attr: &Attribute) -> String {
    let options: Vec<String> = attr
        .enum_options
        .iter()
        .map(|option| format!("'{}'", option.replace('\'', "''")))
        .collect();
    format!(
        "CONSTRAINT {} CHECK ({} IN ({}))",
        check_constraint_name(entity_type, attr),
        column_name(attr),
        options.join(",")
    )
}

fn add_constraint(entity_type: &EntityType, constraint: &str) -> String {
    format!("ALTER TABLE {} ADD {}", table_name(entity_type), constraint)
}

fn drop_constraint(entity_type: &EntityType, constraint_name: &str) -> String {
    format!("ALTER TABLE {} DROP CONSTRAINT {}", table_name(entity_type), constraint_name)
}

fn drop_column(entity_type: &EntityType, attr: &Attribute) -> String {
    format!("ALTER TABLE {} DROP COLUMN {}", table_name(entity_type), column_name(attr))
}

fn alter_column_type(entity_type: &EntityType, attr: &Attribute, sql_type: &str) -> String {
    let column = column_name(attr);
    format!(
        "ALTER TABLE {} ALTER COLUMN {} SET DATA TYPE {} USING {}::{}",
        table_name(entity_type),
        column,
        sql_type,
        column,
        sql_type
    )
}
