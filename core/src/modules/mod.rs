// Modules Layer - 业务模块
//
// 按照六边形架构组织的业务模块：
// - persona: 角色模块，问卷、角色存储与提示词编译
// - chat: 聊天模块，会话管理、上下文窗口与对话编排
// - config: 配置模块，处理应用设置

pub mod chat;
pub mod config;
pub mod persona;

pub use chat::ChatModule;
pub use config::ConfigModule;
pub use persona::PersonaModule;
