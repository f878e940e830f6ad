//! Dynamic repository decoration
//!
//! Cross-cutting repository behavior (auditing, write protection, validation)
//! is selected per entity type at runtime. A stored
//! [`DecoratorConfiguration`] lists decorator ids in order; the
//! [`DynamicRepositoryDecoratorRegistry`] resolves each id to a registered
//! [`DynamicRepositoryDecoratorFactory`] and wraps the repository layer by
//! layer.

pub mod builtin;
pub mod factory;
pub mod meta;
pub mod registry;
pub mod store;

pub use builtin::{
    builtin_factories, AuditDecoratorFactory, AuditOperation, AuditRecord, AuditTrail,
    ReadOnlyDecoratorFactory, RequiredAttributesDecoratorFactory,
};
pub use factory::DynamicRepositoryDecoratorFactory;
pub use meta::{DecoratorConfiguration, DecoratorParameterMap, DecoratorParameters, DECORATOR_CONFIGURATION};
pub use registry::DynamicRepositoryDecoratorRegistry;
pub use store::{DecoratorConfigurationStore, RepositoryDecoratorConfigurationStore};
