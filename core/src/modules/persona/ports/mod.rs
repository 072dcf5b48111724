// Persona Ports - 端口定义

mod key_value_store;
mod persona_repository;

pub use key_value_store::*;
pub use persona_repository::*;
