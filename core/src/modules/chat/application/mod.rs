// Chat Application Layer - 应用层
// 实现 CQRS 模式的命令和查询处理器，以及对话编排

pub mod commands;
pub mod conversation;
pub mod queries;

// 导出命令和查询
pub use commands::*;
pub use conversation::*;
pub use queries::*;

use async_trait::async_trait;
use thiserror::Error;

use super::domain::{ChatSession, EditError, MessageId, SessionId};
use crate::modules::persona::domain::PersonaId;
use crate::modules::persona::ports::{PersonaRepository, RepositoryError};

/// 应用层错误类型
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Persona not found: {0}")]
    PersonaNotFound(PersonaId),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("Message is not a user message: {0}")]
    NotAUserMessage(MessageId),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

impl From<EditError> for ApplicationError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::MessageNotFound(id) => ApplicationError::MessageNotFound(id),
            EditError::NotAUserMessage(id) => ApplicationError::NotAUserMessage(id),
        }
    }
}

/// 命令处理器 trait
///
/// 遵循 CQRS 模式，命令处理器负责执行有副作用的操作
#[async_trait]
pub trait CommandHandler<C, R>: Send + Sync
where
    C: Send + Sync,
{
    /// 执行命令
    async fn handle(&self, command: C) -> Result<R, ApplicationError>;
}

/// 查询处理器 trait
///
/// 遵循 CQRS 模式，查询处理器负责只读操作
#[async_trait]
pub trait QueryHandler<Q, R>: Send + Sync
where
    Q: Send + Sync,
{
    /// 执行查询
    async fn handle(&self, query: Q) -> Result<R, ApplicationError>;
}

/// 对某个会话做一次完整的读-改-写
///
/// `mutate` 返回错误时不写存储，之前的状态保持不变
pub(crate) async fn modify_session<R>(
    repository: &dyn PersonaRepository,
    persona_id: PersonaId,
    session_id: SessionId,
    mutate: impl FnOnce(&mut ChatSession) -> Result<R, ApplicationError> + Send,
) -> Result<R, ApplicationError> {
    let mut personas = repository.load_all().await?;
    let persona = personas
        .iter_mut()
        .find(|p| p.id() == persona_id)
        .ok_or(ApplicationError::PersonaNotFound(persona_id))?;
    let session = persona
        .chat_mut(session_id)
        .ok_or(ApplicationError::SessionNotFound(session_id))?;

    let result = mutate(session)?;
    repository.save_all(&personas).await?;
    Ok(result)
}
