use async_trait::async_trait;
use std::sync::Arc;

use super::super::{QueryHandler, StoreError};
use crate::modules::persona::domain::{Persona, PersonaId};
use crate::modules::persona::ports::PersonaRepository;

/// 获取角色查询
#[derive(Debug, Clone)]
pub struct GetPersonaQuery {
    pub id: PersonaId,
}

impl GetPersonaQuery {
    pub fn new(id: PersonaId) -> Self {
        Self { id }
    }
}

/// 获取角色查询处理器
pub struct GetPersonaHandler {
    repository: Arc<dyn PersonaRepository>,
}

impl GetPersonaHandler {
    pub fn new(repository: Arc<dyn PersonaRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<GetPersonaQuery, Option<Persona>> for GetPersonaHandler {
    async fn handle(&self, query: GetPersonaQuery) -> Result<Option<Persona>, StoreError> {
        let personas = self.repository.load_all().await?;
        Ok(personas.into_iter().find(|p| p.id() == query.id))
    }
}
