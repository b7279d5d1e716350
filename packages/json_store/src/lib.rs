//! JSON-shaped leaf backends for fedstore.

pub mod in_memory;
pub mod value_utils;

pub use in_memory::InMemoryStore;
pub use value_utils::PatchError;
