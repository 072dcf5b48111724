use async_trait::async_trait;
use std::sync::Arc;

use super::super::{CommandHandler, StoreError};
use crate::modules::persona::domain::{Persona, PersonaForm, Questionnaire};
use crate::modules::persona::ports::PersonaRepository;

/// 创建角色命令
#[derive(Debug, Clone)]
pub struct CreatePersonaCommand {
    pub form: PersonaForm,
}

impl CreatePersonaCommand {
    pub fn new(form: PersonaForm) -> Self {
        Self { form }
    }
}

/// 创建角色命令处理器
pub struct CreatePersonaHandler {
    repository: Arc<dyn PersonaRepository>,
    questionnaire: Questionnaire,
}

impl CreatePersonaHandler {
    pub fn new(repository: Arc<dyn PersonaRepository>, questionnaire: Questionnaire) -> Self {
        Self {
            repository,
            questionnaire,
        }
    }
}

#[async_trait]
impl CommandHandler<CreatePersonaCommand, Persona> for CreatePersonaHandler {
    async fn handle(&self, command: CreatePersonaCommand) -> Result<Persona, StoreError> {
        self.questionnaire
            .validate(&command.form)
            .map_err(|errors| StoreError::Validation { errors })?;

        let name = command.form.trimmed_name();
        let mut personas = self.repository.load_all().await?;

        // 先检查再写入，单写者假设
        if personas.iter().any(|p| p.name_matches(&name)) {
            return Err(StoreError::DuplicateName(name));
        }

        let persona = Persona::new(command.form);
        personas.push(persona.clone());
        self.repository.save_all(&personas).await?;

        tracing::info!("[PersonaStore] Created persona {} ({})", persona.name(), persona.id());
        Ok(persona)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::persona::infrastructure::{
        InMemoryKeyValueStore, KeyValuePersonaRepository, DEFAULT_NAMESPACE,
    };
    use crate::shared::ErrorCode;

    fn setup() -> (Arc<InMemoryKeyValueStore>, Arc<KeyValuePersonaRepository>, CreatePersonaHandler) {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let repo = Arc::new(KeyValuePersonaRepository::new(store.clone(), DEFAULT_NAMESPACE));
        let handler = CreatePersonaHandler::new(repo.clone(), Questionnaire::standard());
        (store, repo, handler)
    }

    fn named(name: &str) -> CreatePersonaCommand {
        CreatePersonaCommand::new(PersonaForm::new().with_answer("name", name))
    }

    #[tokio::test]
    async fn test_create_persists_trimmed_name() {
        let (_, repo, handler) = setup();

        let persona = handler.handle(named("  Alex ")).await.unwrap();

        assert_eq!(persona.name(), "Alex");
        let stored = repo.load_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].open_ended().get("name").map(String::as_str), Some("Alex"));
        assert!(stored[0].chats().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_name_is_case_insensitive() {
        let (_, repo, handler) = setup();

        handler.handle(named("Alex")).await.unwrap();
        let err = handler.handle(named("  aLEX ")).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::DuplicateName);
        assert_eq!(repo.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_name_is_validation_error() {
        let (_, repo, handler) = setup();

        let err = handler.handle(named("   ")).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(repo.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_storage_error() {
        let (store, _, handler) = setup();
        store.set_fail_writes(true);

        let err = handler.handle(named("Alex")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::StorageError);
    }
}
