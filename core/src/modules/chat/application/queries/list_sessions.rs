use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, QueryHandler};
use crate::modules::chat::domain::ChatSession;
use crate::modules::persona::domain::PersonaId;
use crate::modules::persona::ports::PersonaRepository;

/// 列出会话查询
#[derive(Debug, Clone)]
pub struct ListSessionsQuery {
    pub persona_id: PersonaId,
}

impl ListSessionsQuery {
    pub fn new(persona_id: PersonaId) -> Self {
        Self { persona_id }
    }
}

/// 列出会话查询处理器
///
/// 按创建时间倒序返回；角色不存在时返回空列表
pub struct ListSessionsHandler {
    repository: Arc<dyn PersonaRepository>,
}

impl ListSessionsHandler {
    pub fn new(repository: Arc<dyn PersonaRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<ListSessionsQuery, Vec<ChatSession>> for ListSessionsHandler {
    async fn handle(&self, query: ListSessionsQuery) -> Result<Vec<ChatSession>, ApplicationError> {
        let personas = self.repository.load_all().await?;
        Ok(personas
            .iter()
            .find(|p| p.id() == query.persona_id)
            .map(|p| p.chats_newest_first())
            .unwrap_or_default())
    }
}
