// Persona Module - 角色模块
//
// 实现六边形架构：
// - domain: 角色实体、问卷、表单值对象、提示词编译
// - ports: 键值存储与角色仓储的抽象接口
// - infrastructure: 文件/内存键值存储和基于键值存储的仓储
// - application: CQRS 命令和查询处理器

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{
    CommandHandler, CreatePersonaCommand, CreatePersonaHandler, DeletePersonaCommand,
    DeletePersonaHandler, GetPersonaHandler, GetPersonaQuery, ListPersonasHandler,
    ListPersonasQuery, QueryHandler, StoreError, UpdatePersonaCommand, UpdatePersonaHandler,
};

pub use domain::{
    compile_system_prompt, Persona, PersonaForm, PersonaId, PromptCompiler, Question,
    QuestionKind, Questionnaire,
};

pub use infrastructure::{
    FileKeyValueStore, InMemoryKeyValueStore, KeyValuePersonaRepository, DEFAULT_NAMESPACE,
};

pub use ports::{KeyValueStore, PersonaRepository, RepositoryError};

use std::sync::Arc;

/// Persona 模块容器
///
/// 管理模块内的依赖注入
pub struct PersonaModule {
    repository: Arc<dyn PersonaRepository>,
    questionnaire: Questionnaire,
    // Handlers
    create_persona_handler: CreatePersonaHandler,
    update_persona_handler: UpdatePersonaHandler,
    delete_persona_handler: DeletePersonaHandler,
    get_persona_handler: GetPersonaHandler,
    list_personas_handler: ListPersonasHandler,
}

impl PersonaModule {
    /// 使用内存存储创建（用于测试）
    pub fn in_memory() -> Self {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        Self::with_store(store, DEFAULT_NAMESPACE)
    }

    /// 基于键值存储创建，整个角色集合存放在 `namespace` 键下
    pub fn with_store(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        let repository: Arc<dyn PersonaRepository> =
            Arc::new(KeyValuePersonaRepository::new(store, namespace));
        Self::with_repository(repository)
    }

    /// 使用自定义仓储创建
    pub fn with_repository(repository: Arc<dyn PersonaRepository>) -> Self {
        let questionnaire = Questionnaire::standard();

        Self {
            create_persona_handler: CreatePersonaHandler::new(repository.clone(), questionnaire),
            update_persona_handler: UpdatePersonaHandler::new(repository.clone(), questionnaire),
            delete_persona_handler: DeletePersonaHandler::new(repository.clone()),
            get_persona_handler: GetPersonaHandler::new(repository.clone()),
            list_personas_handler: ListPersonasHandler::new(repository.clone()),
            repository,
            questionnaire,
        }
    }

    // Command handlers

    /// 创建角色
    pub async fn create_persona(&self, form: PersonaForm) -> Result<Persona, StoreError> {
        self.create_persona_handler
            .handle(CreatePersonaCommand::new(form))
            .await
            .inspect_err(|e| tracing::warn!("[PersonaStore] Create rejected: {}", e))
    }

    /// 更新角色
    pub async fn update_persona(
        &self,
        id: PersonaId,
        form: PersonaForm,
    ) -> Result<Persona, StoreError> {
        self.update_persona_handler
            .handle(UpdatePersonaCommand::new(id, form))
            .await
            .inspect_err(|e| tracing::warn!("[PersonaStore] Update of {} rejected: {}", id, e))
    }

    /// 删除角色及其全部会话
    pub async fn delete_persona(&self, id: PersonaId) -> bool {
        match self
            .delete_persona_handler
            .handle(DeletePersonaCommand::new(id))
            .await
        {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::error!("[PersonaStore] Failed to delete persona {}: {}", id, e);
                false
            }
        }
    }

    // Query handlers

    /// 列出全部角色；存储不可读时记录错误并返回空列表
    pub async fn list_personas(&self) -> Vec<Persona> {
        self.list(ListPersonasQuery::all()).await
    }

    /// 按名称搜索角色
    pub async fn search_personas(&self, term: &str) -> Vec<Persona> {
        self.list(ListPersonasQuery::search(term)).await
    }

    async fn list(&self, query: ListPersonasQuery) -> Vec<Persona> {
        match self.list_personas_handler.handle(query).await {
            Ok(personas) => personas,
            Err(e) => {
                tracing::error!("[PersonaStore] Failed to load personas: {}", e);
                Vec::new()
            }
        }
    }

    /// 获取角色
    pub async fn get_persona(&self, id: PersonaId) -> Option<Persona> {
        match self.get_persona_handler.handle(GetPersonaQuery::new(id)).await {
            Ok(persona) => persona,
            Err(e) => {
                tracing::error!("[PersonaStore] Failed to load persona {}: {}", id, e);
                None
            }
        }
    }

    // Accessors

    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    pub fn repository(&self) -> &Arc<dyn PersonaRepository> {
        &self.repository
    }
}
