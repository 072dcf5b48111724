use thiserror::Error;

use crate::modules::chat::application::ApplicationError;
use crate::modules::chat::domain::SessionId;
use crate::modules::persona::domain::PersonaId;
use crate::shared::ErrorCode;

/// 对话前置条件不满足时的错误
///
/// 生成过程中的失败不会走到这里，它们由兜底回复在本地消化
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Inference engine is not ready")]
    EngineNotReady,

    #[error("Message content cannot be empty")]
    EmptyInput,

    #[error("Another reply is already in progress")]
    Busy,

    #[error("Persona not found: {0}")]
    PersonaNotFound(PersonaId),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Edit failed: {0}")]
    EditFailed(String),

    #[error("Greeting is only generated for an empty session")]
    GreetingNotApplicable,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ConversationError {
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ConversationError::EmptyInput | ConversationError::EditFailed(_) => {
                Some(ErrorCode::ValidationError)
            }
            ConversationError::PersonaNotFound(_) | ConversationError::SessionNotFound(_) => {
                Some(ErrorCode::NotFound)
            }
            ConversationError::Storage(_) => Some(ErrorCode::StorageError),
            _ => None,
        }
    }
}

impl From<ApplicationError> for ConversationError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::PersonaNotFound(id) => ConversationError::PersonaNotFound(id),
            ApplicationError::SessionNotFound(id) => ConversationError::SessionNotFound(id),
            ApplicationError::RepositoryError(e) => ConversationError::Storage(e.to_string()),
            other => ConversationError::EditFailed(other.to_string()),
        }
    }
}
