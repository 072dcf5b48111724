// Persona Infrastructure - 基础设施层

mod file_key_value_store;
mod in_memory_key_value_store;
mod key_value_persona_repository;

pub use file_key_value_store::*;
pub use in_memory_key_value_store::*;
pub use key_value_persona_repository::*;
