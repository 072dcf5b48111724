use async_trait::async_trait;
use std::sync::Arc;

use super::super::{modify_session, ApplicationError, CommandHandler};
use crate::modules::chat::domain::SessionId;
use crate::modules::persona::domain::PersonaId;
use crate::modules::persona::ports::PersonaRepository;

/// 重命名会话命令
#[derive(Debug, Clone)]
pub struct RenameSessionCommand {
    pub persona_id: PersonaId,
    pub session_id: SessionId,
    pub name: String,
}

impl RenameSessionCommand {
    pub fn new(persona_id: PersonaId, session_id: SessionId, name: impl Into<String>) -> Self {
        Self {
            persona_id,
            session_id,
            name: name.into(),
        }
    }
}

/// 重命名会话命令处理器（空白名称被拒绝）
pub struct RenameSessionHandler {
    repository: Arc<dyn PersonaRepository>,
}

impl RenameSessionHandler {
    pub fn new(repository: Arc<dyn PersonaRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CommandHandler<RenameSessionCommand, ()> for RenameSessionHandler {
    async fn handle(&self, command: RenameSessionCommand) -> Result<(), ApplicationError> {
        if command.name.trim().is_empty() {
            return Err(ApplicationError::ValidationError(
                "Session name cannot be empty".to_string(),
            ));
        }

        let name = command.name;
        modify_session(
            self.repository.as_ref(),
            command.persona_id,
            command.session_id,
            move |session| {
                session.rename(&name);
                Ok(())
            },
        )
        .await
    }
}
