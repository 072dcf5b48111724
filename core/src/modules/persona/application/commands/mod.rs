// Persona Application - Commands
// 命令处理器负责有副作用的操作

mod create_persona;
mod delete_persona;
mod update_persona;

pub use create_persona::*;
pub use delete_persona::*;
pub use update_persona::*;
