// Chat Application - Commands
// 会话管理命令，每个命令都是对角色文档的一次读-改-写

mod append_message;
mod create_session;
mod delete_session;
mod edit_message;
mod rename_session;

pub use append_message::*;
pub use create_session::*;
pub use delete_session::*;
pub use edit_message::*;
pub use rename_session::*;
