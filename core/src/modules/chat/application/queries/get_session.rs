use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, QueryHandler};
use crate::modules::chat::domain::{ChatSession, SessionId};
use crate::modules::persona::domain::PersonaId;
use crate::modules::persona::ports::PersonaRepository;

/// 获取会话查询
#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub persona_id: PersonaId,
    pub session_id: SessionId,
}

impl GetSessionQuery {
    pub fn new(persona_id: PersonaId, session_id: SessionId) -> Self {
        Self {
            persona_id,
            session_id,
        }
    }
}

/// 获取会话查询处理器
pub struct GetSessionHandler {
    repository: Arc<dyn PersonaRepository>,
}

impl GetSessionHandler {
    pub fn new(repository: Arc<dyn PersonaRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<GetSessionQuery, Option<ChatSession>> for GetSessionHandler {
    async fn handle(&self, query: GetSessionQuery) -> Result<Option<ChatSession>, ApplicationError> {
        let personas = self.repository.load_all().await?;
        Ok(personas
            .iter()
            .find(|p| p.id() == query.persona_id)
            .and_then(|p| p.chat(query.session_id))
            .cloned())
    }
}
