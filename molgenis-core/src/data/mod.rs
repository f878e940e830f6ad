//! Repositories: storage-access objects for the entities of one entity type

pub mod memory;
pub mod repository;

pub use memory::InMemoryRepository;
pub use repository::{id_to_string, Entity, Repository};
