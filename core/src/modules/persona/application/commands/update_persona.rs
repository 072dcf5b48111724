use async_trait::async_trait;
use std::sync::Arc;

use super::super::{CommandHandler, StoreError};
use crate::modules::persona::domain::{Persona, PersonaForm, PersonaId, Questionnaire};
use crate::modules::persona::ports::PersonaRepository;

/// 更新角色命令
#[derive(Debug, Clone)]
pub struct UpdatePersonaCommand {
    pub id: PersonaId,
    pub form: PersonaForm,
}

impl UpdatePersonaCommand {
    pub fn new(id: PersonaId, form: PersonaForm) -> Self {
        Self { id, form }
    }
}

/// 更新角色命令处理器
///
/// 原地修改属性，保留 id、创建时间和全部会话
pub struct UpdatePersonaHandler {
    repository: Arc<dyn PersonaRepository>,
    questionnaire: Questionnaire,
}

impl UpdatePersonaHandler {
    pub fn new(repository: Arc<dyn PersonaRepository>, questionnaire: Questionnaire) -> Self {
        Self {
            repository,
            questionnaire,
        }
    }
}

#[async_trait]
impl CommandHandler<UpdatePersonaCommand, Persona> for UpdatePersonaHandler {
    async fn handle(&self, command: UpdatePersonaCommand) -> Result<Persona, StoreError> {
        // 先确认目标存在，再校验表单和名称
        let mut personas = self.repository.load_all().await?;
        let index = personas
            .iter()
            .position(|p| p.id() == command.id)
            .ok_or(StoreError::NotFound(command.id))?;

        self.questionnaire
            .validate(&command.form)
            .map_err(|errors| StoreError::Validation { errors })?;

        let name = command.form.trimmed_name();
        if personas
            .iter()
            .any(|p| p.id() != command.id && p.name_matches(&name))
        {
            return Err(StoreError::DuplicateName(name));
        }

        let persona = &mut personas[index];
        persona.apply_form(command.form);
        let updated = persona.clone();

        self.repository.save_all(&personas).await?;

        tracing::info!("[PersonaStore] Updated persona {} ({})", updated.name(), updated.id());
        Ok(updated)
    }
}
