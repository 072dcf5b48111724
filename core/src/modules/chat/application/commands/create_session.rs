use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, CommandHandler};
use crate::modules::chat::domain::ChatSession;
use crate::modules::persona::domain::PersonaId;
use crate::modules::persona::ports::PersonaRepository;

/// 创建会话命令
#[derive(Debug, Clone)]
pub struct CreateSessionCommand {
    pub persona_id: PersonaId,
}

impl CreateSessionCommand {
    pub fn new(persona_id: PersonaId) -> Self {
        Self { persona_id }
    }
}

/// 创建会话命令处理器
///
/// 新会话以创建时间命名，插到角色会话列表的最前面
pub struct CreateSessionHandler {
    repository: Arc<dyn PersonaRepository>,
}

impl CreateSessionHandler {
    pub fn new(repository: Arc<dyn PersonaRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CommandHandler<CreateSessionCommand, ChatSession> for CreateSessionHandler {
    async fn handle(&self, command: CreateSessionCommand) -> Result<ChatSession, ApplicationError> {
        let mut personas = self.repository.load_all().await?;
        let persona = personas
            .iter_mut()
            .find(|p| p.id() == command.persona_id)
            .ok_or(ApplicationError::PersonaNotFound(command.persona_id))?;

        let session = ChatSession::new();
        persona.prepend_chat(session.clone());
        self.repository.save_all(&personas).await?;

        tracing::info!(
            "[SessionManager] Created session {} for persona {}",
            session.id(),
            command.persona_id
        );
        Ok(session)
    }
}
