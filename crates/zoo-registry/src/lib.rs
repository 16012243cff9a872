//! Entity registry trait and in-memory implementation.

mod memory;

pub use memory::InMemoryEntityRegistry;
pub use zoo_types::{Animal, EntityRegistry, NewAnimal, RegistryError};
