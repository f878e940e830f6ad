//! MOLGENIS Data Core
//!
//! The engine behind MOLGENIS dynamic entity storage: it maps a dynamically
//! defined entity schema onto PostgreSQL and wraps repositories with
//! per-entity-type decorator chains configured at runtime.
//!
//! # Overview
//!
//! Entity types and attributes are plain data ([`meta`]). When an attribute is
//! added, updated or deleted, the DDL synthesizer ([`postgresql::ddl`]) derives
//! the exact statements needed and the repository collection
//! ([`postgresql::PostgreSqlRepositoryCollection`]) applies them to every
//! concrete table inside one transaction.
//!
//! Independently, the [`decorator`] registry turns a stored, ordered decorator
//! configuration into a chain of repository wrappers once bootstrapping has
//! finished ([`lifecycle`]). The [`upgrade`] chain evolves persisted schema and
//! configuration across releases before any of that happens.
//!
//! # Example
//!
//! ```rust,ignore
//! use molgenis_core::prelude::*;
//! use std::sync::Arc;
//!
//! let metadata = Arc::new(MetadataRegistry::new());
//! let database = Arc::new(JournalDatabase::new());
//! let collection = PostgreSqlRepositoryCollection::new(database.clone(), metadata.clone());
//!
//! let person = EntityType::new("person")
//!     .with_attribute(Attribute::new("id", AttributeType::String).with_nillable(false))
//!     .with_id_attribute("id");
//! let email = Attribute::new("email", AttributeType::Email).with_unique(true);
//! collection.add_attribute(&person, &email).await?;
//! ```
//!
//! # Architecture
//!
//! - [`meta`] - Entity type / attribute model and the metadata query seam
//! - [`postgresql`] - DDL synthesis and schema migration coordination
//! - [`storage`] - Transactional SQL execution seam
//! - [`data`] - Repository abstraction and an in-memory backend
//! - [`decorator`] - Dynamic repository decorator registry
//! - [`lifecycle`] - Bootstrapping events and the set-once bootstrapped flag
//! - [`upgrade`] - Versioned upgrade step chain
//! - [`bootstrap`] - Startup sequencing of all of the above
//! - [`config`] - TOML + environment configuration
//! - [`logging`] - `env_logger` setup with human or JSON output

pub mod bootstrap;
pub mod config; // Configuration system with TOML support
pub mod data;
pub mod decorator;
pub mod lifecycle;
pub mod logging;
pub mod meta;
pub mod postgresql;
pub mod storage;
pub mod upgrade;

#[cfg(test)]
pub mod testing;

pub mod prelude;

pub use bootstrap::Bootstrapper;
pub use decorator::{DynamicRepositoryDecoratorFactory, DynamicRepositoryDecoratorRegistry};
pub use meta::{Attribute, AttributeType, EntityType};
pub use postgresql::PostgreSqlRepositoryCollection;

/// Main result type for the data core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type shared by every module of the data core
///
/// Validation, not-found and duplicate-registration errors are surfaced to the
/// caller as-is and are never retried. Storage and upgrade errors are fatal at
/// startup.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Illegal schema edit or invalid entity data
    #[error("{0}")]
    DataValidation(String),
    #[error("Unknown attribute [{attribute}] of entity type [{entity_type}]")]
    UnknownAttribute { entity_type: String, attribute: String },
    #[error("Unknown entity [{id}] of type [{entity_type}]")]
    UnknownEntity { entity_type: String, id: String },
    #[error("Unknown dynamic decorator factory [{0}]")]
    UnknownDecoratorFactory(String),
    #[error("Dynamic decorator factory with id [{0}] is already registered")]
    DuplicateDecoratorFactory(String),
    #[error("Repository [{0}] is read-only")]
    ReadOnly(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Upgrade to version [{version}] failed: {reason}")]
    Upgrade { version: u32, reason: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Whether this error is a domain/validation error caused by the caller's input
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::DataValidation(_) | Error::ReadOnly(_))
    }

    /// Whether this error reports something that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::UnknownAttribute { .. }
                | Error::UnknownEntity { .. }
                | Error::UnknownDecoratorFactory(_)
        )
    }
}
