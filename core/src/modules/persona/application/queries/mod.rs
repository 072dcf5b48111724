// Persona Application - Queries
// 查询处理器负责只读操作

mod get_persona;
mod list_personas;

pub use get_persona::*;
pub use list_personas::*;
