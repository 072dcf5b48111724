use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, CommandHandler};
use crate::modules::chat::domain::SessionId;
use crate::modules::persona::domain::PersonaId;
use crate::modules::persona::ports::PersonaRepository;

/// 删除会话命令
#[derive(Debug, Clone)]
pub struct DeleteSessionCommand {
    pub persona_id: PersonaId,
    pub session_id: SessionId,
}

impl DeleteSessionCommand {
    pub fn new(persona_id: PersonaId, session_id: SessionId) -> Self {
        Self {
            persona_id,
            session_id,
        }
    }
}

/// 删除会话命令处理器（连同会话内全部消息）
pub struct DeleteSessionHandler {
    repository: Arc<dyn PersonaRepository>,
}

impl DeleteSessionHandler {
    pub fn new(repository: Arc<dyn PersonaRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CommandHandler<DeleteSessionCommand, ()> for DeleteSessionHandler {
    async fn handle(&self, command: DeleteSessionCommand) -> Result<(), ApplicationError> {
        let mut personas = self.repository.load_all().await?;
        let persona = personas
            .iter_mut()
            .find(|p| p.id() == command.persona_id)
            .ok_or(ApplicationError::PersonaNotFound(command.persona_id))?;

        if !persona.remove_chat(command.session_id) {
            return Err(ApplicationError::SessionNotFound(command.session_id));
        }

        self.repository.save_all(&personas).await?;
        tracing::info!("[SessionManager] Deleted session {}", command.session_id);
        Ok(())
    }
}
