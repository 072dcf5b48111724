// Chat Application - Queries

mod get_session;
mod list_sessions;

pub use get_session::*;
pub use list_sessions::*;
