//! PostgreSQL backend: DDL synthesis and schema migration coordination
//!
//! [`ddl::DdlSynthesizer`] turns attribute definitions into statements for a
//! single table. [`PostgreSqlRepositoryCollection`] decides which tables a
//! change touches and executes the result transactionally.

pub mod collection;
pub mod ddl;
pub mod naming;
pub mod types;

pub use collection::PostgreSqlRepositoryCollection;
pub use ddl::DdlSynthesizer;
pub use types::DEFAULT_STRING_LENGTH;

/// Backend name of entity types stored in PostgreSQL
pub const POSTGRESQL: &str = "PostgreSQL";
