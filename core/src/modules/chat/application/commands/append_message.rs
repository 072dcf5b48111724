use async_trait::async_trait;
use std::sync::Arc;

use super::super::{modify_session, ApplicationError, CommandHandler};
use crate::modules::chat::domain::{Message, SessionId};
use crate::modules::persona::domain::PersonaId;
use crate::modules::persona::ports::PersonaRepository;

/// 追加消息命令
#[derive(Debug, Clone)]
pub struct AppendMessageCommand {
    pub persona_id: PersonaId,
    pub session_id: SessionId,
    pub content: String,
    pub is_user: bool,
}

impl AppendMessageCommand {
    pub fn new(
        persona_id: PersonaId,
        session_id: SessionId,
        content: impl Into<String>,
        is_user: bool,
    ) -> Self {
        Self {
            persona_id,
            session_id,
            content: content.into(),
            is_user,
        }
    }
}

/// 追加消息命令处理器，返回落盘的消息
pub struct AppendMessageHandler {
    repository: Arc<dyn PersonaRepository>,
}

impl AppendMessageHandler {
    pub fn new(repository: Arc<dyn PersonaRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CommandHandler<AppendMessageCommand, Message> for AppendMessageHandler {
    async fn handle(&self, command: AppendMessageCommand) -> Result<Message, ApplicationError> {
        let message = Message::new(command.content, command.is_user);
        let stored = message.clone();

        modify_session(
            self.repository.as_ref(),
            command.persona_id,
            command.session_id,
            move |session| {
                session.push_message(stored);
                Ok(())
            },
        )
        .await?;

        tracing::debug!(
            "[SessionManager] Appended {} message {} to session {}",
            if message.is_user() { "user" } else { "bot" },
            message.id(),
            command.session_id
        );
        Ok(message)
    }
}
