use async_trait::async_trait;
use std::sync::Arc;

use super::super::{CommandHandler, StoreError};
use crate::modules::persona::domain::PersonaId;
use crate::modules::persona::ports::PersonaRepository;

/// 删除角色命令（级联删除全部会话）
#[derive(Debug, Clone)]
pub struct DeletePersonaCommand {
    pub id: PersonaId,
}

impl DeletePersonaCommand {
    pub fn new(id: PersonaId) -> Self {
        Self { id }
    }
}

/// 删除角色命令处理器
///
/// 返回是否删除了角色；未知 id 不写存储
pub struct DeletePersonaHandler {
    repository: Arc<dyn PersonaRepository>,
}

impl DeletePersonaHandler {
    pub fn new(repository: Arc<dyn PersonaRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CommandHandler<DeletePersonaCommand, bool> for DeletePersonaHandler {
    async fn handle(&self, command: DeletePersonaCommand) -> Result<bool, StoreError> {
        let mut personas = self.repository.load_all().await?;
        let before = personas.len();
        personas.retain(|p| p.id() != command.id);

        if personas.len() == before {
            tracing::warn!("[PersonaStore] Persona not found for delete: {}", command.id);
            return Ok(false);
        }

        self.repository.save_all(&personas).await?;
        tracing::info!("[PersonaStore] Deleted persona {}", command.id);
        Ok(true)
    }
}
