//! Schema migration coordinator for PostgreSQL backed entity types

use std::sync::Arc;

use super::ddl::{ensure_absent, ensure_present, ensure_same_name, DdlSynthesizer};
use crate::config::DatabaseConfig;
use crate::meta::{Attribute, EntityType, EntityTypeQuery};
use crate::storage::{execute_in_transaction, SqlDatabase};
use crate::Result;

/// Applies entity type and attribute changes to PostgreSQL
///
/// Attribute changes on an abstract entity type are propagated to every
/// concrete entity type extending it, through any number of intermediate
/// abstract levels. All statements of one change run in a single transaction.
pub struct PostgreSqlRepositoryCollection {
    database: Arc<dyn SqlDatabase>,
    metadata: Arc<dyn EntityTypeQuery>,
    synthesizer: DdlSynthesizer,
}

impl PostgreSqlRepositoryCollection {
    pub fn new(database: Arc<dyn SqlDatabase>, metadata: Arc<dyn EntityTypeQuery>) -> Self {
        Self {
            database,
            metadata,
            synthesizer: DdlSynthesizer::default(),
        }
    }

    /// Collection sizing string columns from the database configuration
    pub fn from_config(
        database: Arc<dyn SqlDatabase>,
        metadata: Arc<dyn EntityTypeQuery>,
        config: &DatabaseConfig,
    ) -> Self {
        Self::new(database, metadata).with_default_string_length(config.default_string_length)
    }

    /// Length of string-like columns without an explicit max length
    pub fn with_default_string_length(self, length: u32) -> Self {
        self.with_synthesizer(DdlSynthesizer::new(length))
    }

    pub fn with_synthesizer(mut self, synthesizer: DdlSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn synthesizer(&self) -> &DdlSynthesizer {
        &self.synthesizer
    }

    pub async fn add_attribute(&self, entity_type: &EntityType, attr: &Attribute) -> Result<()> {
        let statements = self.plan_add_attribute(entity_type, attr).await?;
        log::info!(
            "Adding attribute [{}] to entity type [{}]: {} statement(s)",
            attr.name,
            entity_type.id,
            statements.len()
        );
        self.execute(&statements).await
    }

    pub async fn update_attribute(
        &self,
        entity_type: &EntityType,
        attr: &Attribute,
        updated: &Attribute,
    ) -> Result<()> {
        let statements = self.plan_update_attribute(entity_type, attr, updated).await?;
        log::info!(
            "Updating attribute [{}] of entity type [{}]: {} statement(s)",
            attr.name,
            entity_type.id,
            statements.len()
        );
        self.execute(&statements).await
    }

    pub async fn delete_attribute(&self, entity_type: &EntityType, attr: &Attribute) -> Result<()> {
        let statements = self.plan_delete_attribute(entity_type, attr).await?;
        log::info!(
            "Deleting attribute [{}] from entity type [{}]: {} statement(s)",
            attr.name,
            entity_type.id,
            statements.len()
        );
        self.execute(&statements).await
    }

    pub async fn create_entity_type(&self, entity_type: &EntityType) -> Result<()> {
        let statements = self.synthesizer.synthesize_create_table(entity_type)?;
        log::info!("Creating table for entity type [{}]", entity_type.id);
        self.execute(&statements).await
    }

    pub async fn delete_entity_type(&self, entity_type: &EntityType) -> Result<()> {
        let statements = self.synthesizer.synthesize_drop_table(entity_type)?;
        log::info!("Dropping table of entity type [{}]", entity_type.id);
        self.execute(&statements).await
    }

    /// Statements `add_attribute` would execute
    pub async fn plan_add_attribute(&self, entity_type: &EntityType, attr: &Attribute) -> Result<Vec<String>> {
        ensure_absent(entity_type, attr)?;
        let mut statements = Vec::new();
        for concrete in self.concrete_entity_types(entity_type).await? {
            statements.extend(self.synthesizer.add_statements(&concrete, attr)?);
        }
        Ok(statements)
    }

    /// Statements `update_attribute` would execute
    pub async fn plan_update_attribute(
        &self,
        entity_type: &EntityType,
        attr: &Attribute,
        updated: &Attribute,
    ) -> Result<Vec<String>> {
        ensure_present(entity_type, attr)?;
        ensure_same_name(entity_type, attr, updated)?;
        let mut statements = Vec::new();
        for concrete in self.concrete_entity_types(entity_type).await? {
            statements.extend(self.synthesizer.alter_statements(&concrete, attr, updated)?);
        }
        Ok(statements)
    }

    /// Statements `delete_attribute` would execute
    pub async fn plan_delete_attribute(&self, entity_type: &EntityType, attr: &Attribute) -> Result<Vec<String>> {
        ensure_present(entity_type, attr)?;
        let mut statements = Vec::new();
        for concrete in self.concrete_entity_types(entity_type).await? {
            statements.extend(self.synthesizer.drop_statements(&concrete, attr)?);
        }
        Ok(statements)
    }

    /// The entity type itself when concrete, otherwise its concrete descendants
    ///
    /// Descendants are visited depth first in the order the metadata query
    /// returns children, so the children of an intermediate abstract type
    /// come before its later siblings.
    pub async fn concrete_entity_types(&self, entity_type: &EntityType) -> Result<Vec<Arc<EntityType>>> {
        if !entity_type.is_abstract {
            return Ok(vec![Arc::new(entity_type.clone())]);
        }

        let mut concrete = Vec::new();
        let mut pending: Vec<Arc<EntityType>> = self.metadata.find_entity_types_extending(entity_type).await?;
        pending.reverse();
        while let Some(candidate) = pending.pop() {
            if candidate.is_abstract {
                let mut children = self.metadata.find_entity_types_extending(&candidate).await?;
                children.reverse();
                pending.extend(children);
            } else {
                concrete.push(candidate);
            }
        }
        log::debug!(
            "Abstract entity type [{}] has {} concrete descendant(s)",
            entity_type.id,
            concrete.len()
        );
        Ok(concrete)
    }

    async fn execute(&self, statements: &[String]) -> Result<()> {
        if statements.is_empty() {
            return Ok(());
        }
        execute_in_transaction(self.database.as_ref(), statements).await
    }
}
