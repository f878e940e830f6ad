//! Entity type and attribute model
//!
//! Plain data: entity types, their attributes and the attribute data type
//! enumeration, plus the [`EntityTypeQuery`] seam through which the schema
//! migration coordinator discovers concrete descendants of abstract types.

pub mod attribute;
pub mod attribute_type;
pub mod entity_type;
pub mod registry;

pub use attribute::Attribute;
pub use attribute_type::AttributeType;
pub use entity_type::{EntityType, DEFAULT_BACKEND};
pub use registry::{EntityTypeQuery, MetadataRegistry};
