// Chat Module - 聊天模块
//
// 实现六边形架构（Hexagonal Architecture）：
// - domain: 领域层，包含会话/消息实体、值对象和上下文窗口服务
// - ports: 端口层，定义推理引擎的抽象接口
// - infrastructure: 基础设施层，推理适配器与引擎生命周期句柄
// - application: 应用层，会话 CQRS 处理器与对话编排

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

// 重新导出常用类型
pub use application::{
    // Traits
    ApplicationError,
    CommandHandler,
    QueryHandler,
    // Commands
    AppendMessageCommand,
    AppendMessageHandler,
    CreateSessionCommand,
    CreateSessionHandler,
    DeleteSessionCommand,
    DeleteSessionHandler,
    EditMessageCommand,
    EditMessageHandler,
    RenameSessionCommand,
    RenameSessionHandler,
    // Queries
    GetSessionHandler,
    GetSessionQuery,
    ListSessionsHandler,
    ListSessionsQuery,
    // Conversation
    Conversation,
    ConversationError,
    ConversationState,
    PendingReply,
    TurnKind,
    TurnOutcome,
};

pub use domain::{
    build_context, ChatMessage, ChatSession, ContextBuilder, EditError, Message, MessageId,
    MessageRole, SessionId,
};

pub use infrastructure::{
    EngineHandle, EnginePhase, EngineStatus, LocalServerConfig, LocalServerEngine,
    MockInferenceEngine, MockReply,
};

pub use ports::{
    CompletionRequest, DeltaStream, InferenceEngine, InferenceError, InitProgress,
    ProgressCallback, StreamChunk,
};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::infrastructure::EventBus;
use crate::modules::config::ConversationConfig;
use crate::modules::persona::domain::PersonaId;
use crate::modules::persona::ports::PersonaRepository;

/// 打开角色聊天视图的结果
#[derive(Debug, Clone)]
pub struct ChatView {
    /// 会话列表，最新的在前
    pub sessions: Vec<ChatSession>,
    pub active_session_id: SessionId,
    /// 新建的空会话得到的问候
    pub greeting: Option<TurnOutcome>,
}

/// 新建会话的结果
#[derive(Debug, Clone)]
pub struct NewChat {
    pub session: ChatSession,
    pub greeting: Option<TurnOutcome>,
}

/// Chat 模块容器
///
/// 管理模块内的依赖注入
pub struct ChatModule {
    repository: Arc<dyn PersonaRepository>,
    engine: Arc<EngineHandle>,
    events: Arc<EventBus>,
    config: ConversationConfig,
    // 每个角色一个编排器，状态机需要跨调用保持
    conversations: RwLock<HashMap<PersonaId, Arc<Conversation>>>,
    // Handlers
    create_session_handler: CreateSessionHandler,
    rename_session_handler: RenameSessionHandler,
    delete_session_handler: DeleteSessionHandler,
    append_message_handler: AppendMessageHandler,
    edit_message_handler: EditMessageHandler,
    get_session_handler: GetSessionHandler,
    list_sessions_handler: ListSessionsHandler,
}

impl ChatModule {
    /// 使用角色仓储和推理引擎创建 ChatModule
    pub fn with_repository(
        repository: Arc<dyn PersonaRepository>,
        engine: Arc<EngineHandle>,
        events: Arc<EventBus>,
        config: ConversationConfig,
    ) -> Self {
        Self {
            create_session_handler: CreateSessionHandler::new(repository.clone()),
            rename_session_handler: RenameSessionHandler::new(repository.clone()),
            delete_session_handler: DeleteSessionHandler::new(repository.clone()),
            append_message_handler: AppendMessageHandler::new(repository.clone()),
            edit_message_handler: EditMessageHandler::new(repository.clone()),
            get_session_handler: GetSessionHandler::new(repository.clone()),
            list_sessions_handler: ListSessionsHandler::new(repository.clone()),
            repository,
            engine,
            events,
            config,
            conversations: RwLock::new(HashMap::new()),
        }
    }

    // Session Manager

    /// 列出会话（最新的在前），角色不存在时为空列表
    pub async fn list_sessions(&self, persona_id: PersonaId) -> Vec<ChatSession> {
        self.list_sessions_handler
            .handle(ListSessionsQuery::new(persona_id))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("[SessionManager] Failed to list sessions: {}", e);
                Vec::new()
            })
    }

    pub async fn get_session(
        &self,
        persona_id: PersonaId,
        session_id: SessionId,
    ) -> Option<ChatSession> {
        self.get_session_handler
            .handle(GetSessionQuery::new(persona_id, session_id))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("[SessionManager] Failed to load session: {}", e);
                None
            })
    }

    /// 新建会话，角色不存在时返回 None
    pub async fn create_session(&self, persona_id: PersonaId) -> Option<ChatSession> {
        self.create_session_handler
            .handle(CreateSessionCommand::new(persona_id))
            .await
            .inspect_err(|e| tracing::warn!("[SessionManager] Failed to create session: {}", e))
            .ok()
    }

    pub async fn rename_session(
        &self,
        persona_id: PersonaId,
        session_id: SessionId,
        name: &str,
    ) -> bool {
        self.rename_session_handler
            .handle(RenameSessionCommand::new(persona_id, session_id, name))
            .await
            .inspect_err(|e| tracing::warn!("[SessionManager] Failed to rename session: {}", e))
            .is_ok()
    }

    pub async fn delete_session(&self, persona_id: PersonaId, session_id: SessionId) -> bool {
        self.delete_session_handler
            .handle(DeleteSessionCommand::new(persona_id, session_id))
            .await
            .inspect_err(|e| tracing::warn!("[SessionManager] Failed to delete session: {}", e))
            .is_ok()
    }

    pub async fn append_message(
        &self,
        persona_id: PersonaId,
        session_id: SessionId,
        content: &str,
        is_user: bool,
    ) -> bool {
        self.append_message_handler
            .handle(AppendMessageCommand::new(
                persona_id, session_id, content, is_user,
            ))
            .await
            .inspect_err(|e| tracing::warn!("[SessionManager] Failed to append message: {}", e))
            .is_ok()
    }

    /// 改写用户消息并删除紧随其后的一条 bot 回复
    pub async fn edit_user_message_and_prune_reply(
        &self,
        persona_id: PersonaId,
        session_id: SessionId,
        message_id: MessageId,
        content: &str,
    ) -> bool {
        self.edit_message_handler
            .handle(EditMessageCommand::new(
                persona_id, session_id, message_id, content,
            ))
            .await
            .inspect_err(|e| tracing::warn!("[SessionManager] Failed to edit message: {}", e))
            .is_ok()
    }

    // Conversation

    /// 获取（或创建）角色的对话编排器
    pub async fn conversation(&self, persona_id: PersonaId) -> Arc<Conversation> {
        if let Some(conversation) = self.conversations.read().await.get(&persona_id) {
            return conversation.clone();
        }

        let mut conversations = self.conversations.write().await;
        conversations
            .entry(persona_id)
            .or_insert_with(|| {
                Arc::new(Conversation::new(
                    persona_id,
                    self.repository.clone(),
                    self.engine.clone(),
                    self.events.clone(),
                    self.config.clone(),
                ))
            })
            .clone()
    }

    /// 角色删除后释放其对话编排器
    pub async fn forget_persona(&self, persona_id: PersonaId) {
        if self.conversations.write().await.remove(&persona_id).is_some() {
            tracing::debug!("[Conversation] Released conversation for persona {}", persona_id);
        }
    }

    pub async fn send_message(
        &self,
        persona_id: PersonaId,
        session_id: SessionId,
        input: &str,
    ) -> Result<TurnOutcome, ConversationError> {
        self.conversation(persona_id)
            .await
            .send_message(session_id, input)
            .await
    }

    pub async fn edit_message(
        &self,
        persona_id: PersonaId,
        session_id: SessionId,
        message_id: MessageId,
        content: &str,
    ) -> Result<TurnOutcome, ConversationError> {
        self.conversation(persona_id)
            .await
            .edit_message(session_id, message_id, content)
            .await
    }

    /// 打开角色的聊天视图
    ///
    /// 已有会话时激活最新的一个；没有会话时新建一个，引擎就绪则生成问候
    pub async fn open_persona(&self, persona_id: PersonaId) -> Option<ChatView> {
        let sessions = self.list_sessions(persona_id).await;
        if let Some(newest) = sessions.first() {
            return Some(ChatView {
                active_session_id: newest.id(),
                sessions,
                greeting: None,
            });
        }

        let NewChat { session, greeting } = self.start_new_chat(persona_id).await?;
        Some(ChatView {
            active_session_id: session.id(),
            sessions: self.list_sessions(persona_id).await,
            greeting,
        })
    }

    /// 新建会话，引擎就绪时生成问候
    pub async fn start_new_chat(&self, persona_id: PersonaId) -> Option<NewChat> {
        let session = self.create_session(persona_id).await?;

        let greeting = if self.engine.is_ready() {
            self.conversation(persona_id)
                .await
                .greet(session.id())
                .await
                .inspect_err(|e| tracing::warn!("[Conversation] Greeting skipped: {}", e))
                .ok()
        } else {
            None
        };

        Some(NewChat { session, greeting })
    }

    /// 删除会话，返回接下来应激活的会话（剩余中最新的）
    pub async fn delete_chat(
        &self,
        persona_id: PersonaId,
        session_id: SessionId,
    ) -> Option<SessionId> {
        if !self.delete_session(persona_id, session_id).await {
            return None;
        }
        self.list_sessions(persona_id)
            .await
            .first()
            .map(ChatSession::id)
    }

    // Accessors

    pub fn engine(&self) -> &Arc<EngineHandle> {
        &self.engine
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::persona::{InMemoryKeyValueStore, KeyValuePersonaRepository, PersonaModule};
    use crate::modules::persona::domain::PersonaForm;
    use crate::modules::persona::DEFAULT_NAMESPACE;

    async fn setup(engine: MockInferenceEngine) -> (PersonaModule, ChatModule) {
        let repository: Arc<dyn PersonaRepository> = Arc::new(KeyValuePersonaRepository::new(
            Arc::new(InMemoryKeyValueStore::new()),
            DEFAULT_NAMESPACE,
        ));
        let engine = Arc::new(EngineHandle::new(Arc::new(engine), "mock-model"));
        let personas = PersonaModule::with_repository(repository.clone());
        let chat = ChatModule::with_repository(
            repository,
            engine,
            Arc::new(EventBus::new()),
            ConversationConfig::default(),
        );
        (personas, chat)
    }

    fn form(name: &str) -> PersonaForm {
        PersonaForm::new().with_answer("name", name)
    }

    #[tokio::test]
    async fn test_sessions_are_listed_newest_first() {
        let (personas, chat) = setup(MockInferenceEngine::new()).await;
        let persona = personas.create_persona(form("Alex")).await.unwrap();

        let s1 = chat.create_session(persona.id()).await.unwrap();
        let s2 = chat.create_session(persona.id()).await.unwrap();

        let ids: Vec<_> = chat
            .list_sessions(persona.id())
            .await
            .iter()
            .map(ChatSession::id)
            .collect();
        assert_eq!(ids, vec![s2.id(), s1.id()]);
    }

    #[tokio::test]
    async fn test_deleting_persona_removes_sessions() {
        let (personas, chat) = setup(MockInferenceEngine::new()).await;
        let persona = personas.create_persona(form("Alex")).await.unwrap();
        chat.create_session(persona.id()).await.unwrap();

        assert!(personas.delete_persona(persona.id()).await);

        assert!(chat.list_sessions(persona.id()).await.is_empty());
        assert!(chat.create_session(persona.id()).await.is_none());
    }

    #[tokio::test]
    async fn test_session_operations_report_booleans() {
        let (personas, chat) = setup(MockInferenceEngine::new()).await;
        let persona = personas.create_persona(form("Alex")).await.unwrap();
        let session = chat.create_session(persona.id()).await.unwrap();

        assert!(chat.rename_session(persona.id(), session.id(), "  Trip  ").await);
        assert!(!chat.rename_session(persona.id(), session.id(), "   ").await);
        assert!(chat.append_message(persona.id(), session.id(), "Hi", true).await);
        assert!(!chat.append_message(persona.id(), SessionId::new(), "Hi", true).await);
        assert!(
            !chat
                .edit_user_message_and_prune_reply(persona.id(), session.id(), MessageId::new(), "x")
                .await
        );

        let stored = chat.get_session(persona.id(), session.id()).await.unwrap();
        assert_eq!(stored.name(), "Trip");
        assert_eq!(stored.messages().len(), 1);

        assert!(chat.delete_session(persona.id(), session.id()).await);
        assert!(!chat.delete_session(persona.id(), session.id()).await);
    }

    #[tokio::test]
    async fn test_edit_prunes_following_reply() {
        let (personas, chat) = setup(MockInferenceEngine::new()).await;
        let persona = personas.create_persona(form("Alex")).await.unwrap();
        let session = chat.create_session(persona.id()).await.unwrap();
        chat.append_message(persona.id(), session.id(), "A", true).await;
        chat.append_message(persona.id(), session.id(), "B", false).await;
        chat.append_message(persona.id(), session.id(), "C", true).await;
        let target = chat.get_session(persona.id(), session.id()).await.unwrap().messages()[0].id();

        assert!(
            chat.edit_user_message_and_prune_reply(persona.id(), session.id(), target, "A'")
                .await
        );

        let stored = chat.get_session(persona.id(), session.id()).await.unwrap();
        let contents: Vec<_> = stored.messages().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["A'", "C"]);
    }

    #[tokio::test]
    async fn test_open_persona_greets_fresh_session() {
        let (personas, chat) = setup(MockInferenceEngine::new()).await;
        chat.engine().initialize().await.unwrap();
        let persona = personas.create_persona(form("Alex")).await.unwrap();

        let view = chat.open_persona(persona.id()).await.unwrap();

        assert_eq!(view.sessions.len(), 1);
        assert!(matches!(view.greeting, Some(TurnOutcome::Replied(_))));
        let messages = view.sessions[0].messages();
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].is_user());

        // 再次打开沿用已有会话，不再问候
        let again = chat.open_persona(persona.id()).await.unwrap();
        assert_eq!(again.active_session_id, view.active_session_id);
        assert!(again.greeting.is_none());
    }

    #[tokio::test]
    async fn test_open_unknown_persona() {
        let (_, chat) = setup(MockInferenceEngine::new()).await;
        assert!(chat.open_persona(PersonaId::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_new_chat_without_ready_engine_skips_greeting() {
        let (personas, chat) = setup(MockInferenceEngine::new()).await;
        let persona = personas.create_persona(form("Alex")).await.unwrap();

        let new_chat = chat.start_new_chat(persona.id()).await.unwrap();

        assert!(new_chat.greeting.is_none());
        let stored = chat.get_session(persona.id(), new_chat.session.id()).await.unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_delete_chat_activates_newest_remaining() {
        let (personas, chat) = setup(MockInferenceEngine::new()).await;
        let persona = personas.create_persona(form("Alex")).await.unwrap();
        let s1 = chat.create_session(persona.id()).await.unwrap();
        let s2 = chat.create_session(persona.id()).await.unwrap();

        assert_eq!(chat.delete_chat(persona.id(), s2.id()).await, Some(s1.id()));
        assert_eq!(chat.delete_chat(persona.id(), s1.id()).await, None);
    }

    #[tokio::test]
    async fn test_conversation_is_shared_per_persona() {
        let (personas, chat) = setup(MockInferenceEngine::new()).await;
        let persona = personas.create_persona(form("Alex")).await.unwrap();

        let a = chat.conversation(persona.id()).await;
        let b = chat.conversation(persona.id()).await;
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_forget_persona_releases_conversation() {
        let (personas, chat) = setup(MockInferenceEngine::new()).await;
        let persona = personas.create_persona(form("Alex")).await.unwrap();

        let before = chat.conversation(persona.id()).await;
        chat.forget_persona(persona.id()).await;
        assert!(chat.conversations.read().await.is_empty());

        let after = chat.conversation(persona.id()).await;
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn test_send_message_round_trip() {
        let (personas, chat) = setup(
            MockInferenceEngine::new().with_replies([MockReply::text(&["Nice to meet you"])]),
        )
        .await;
        chat.engine().initialize().await.unwrap();
        let persona = personas.create_persona(form("Alex")).await.unwrap();
        let session = chat.create_session(persona.id()).await.unwrap();

        let outcome = chat
            .send_message(persona.id(), session.id(), "Hello")
            .await
            .unwrap();

        assert_eq!(outcome.message().unwrap().content(), "Nice to meet you");
        let stored = chat.get_session(persona.id(), session.id()).await.unwrap();
        assert_eq!(stored.messages().len(), 2);
    }
}
