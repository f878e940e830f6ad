//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use molgenis_core::prelude::*;
//! ```

// === Errors ===
pub use crate::{Error, Result};

// === Metadata ===
pub use crate::meta::{Attribute, AttributeType, EntityType, EntityTypeQuery, MetadataRegistry};

// === Schema migration ===
pub use crate::postgresql::{DdlSynthesizer, PostgreSqlRepositoryCollection};
pub use crate::storage::{JournalDatabase, SqlDatabase, SqlTransaction};

// === Repositories and decoration ===
pub use crate::data::{Entity, InMemoryRepository, Repository};
pub use crate::decorator::{
    DecoratorConfiguration, DecoratorConfigurationStore, DecoratorParameterMap, DecoratorParameters,
    DynamicRepositoryDecoratorFactory, DynamicRepositoryDecoratorRegistry, RepositoryDecoratorConfigurationStore,
};

// === Lifecycle ===
pub use crate::bootstrap::{BootstrapReport, Bootstrapper};
pub use crate::lifecycle::{BootstrapState, BootstrappingEvent, BootstrappingStatus};
pub use crate::upgrade::{UpgradeService, UpgradeStep, VersionStore};

// === Configuration ===
pub use crate::config::MolgenisConfig;
pub use crate::logging::init_logging;
