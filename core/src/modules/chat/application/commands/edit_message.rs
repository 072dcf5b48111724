use async_trait::async_trait;
use std::sync::Arc;

use super::super::{modify_session, ApplicationError, CommandHandler};
use crate::modules::chat::domain::{MessageId, SessionId};
use crate::modules::persona::domain::PersonaId;
use crate::modules::persona::ports::PersonaRepository;

/// 编辑用户消息命令
///
/// 改写目标用户消息，并删除紧随其后的那条 bot 回复
#[derive(Debug, Clone)]
pub struct EditMessageCommand {
    pub persona_id: PersonaId,
    pub session_id: SessionId,
    pub message_id: MessageId,
    pub content: String,
}

impl EditMessageCommand {
    pub fn new(
        persona_id: PersonaId,
        session_id: SessionId,
        message_id: MessageId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            persona_id,
            session_id,
            message_id,
            content: content.into(),
        }
    }
}

/// 编辑消息命令处理器，返回是否删除了旧回复
pub struct EditMessageHandler {
    repository: Arc<dyn PersonaRepository>,
}

impl EditMessageHandler {
    pub fn new(repository: Arc<dyn PersonaRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CommandHandler<EditMessageCommand, bool> for EditMessageHandler {
    async fn handle(&self, command: EditMessageCommand) -> Result<bool, ApplicationError> {
        let message_id = command.message_id;
        let content = command.content;

        let pruned = modify_session(
            self.repository.as_ref(),
            command.persona_id,
            command.session_id,
            move |session| Ok(session.edit_user_message_and_prune_reply(message_id, content)?),
        )
        .await?;

        tracing::debug!(
            "[SessionManager] Edited message {} (reply pruned: {})",
            message_id,
            pruned
        );
        Ok(pruned)
    }
}
