// Conversation - 对话编排
//
// 协调发送、问候、编辑三种生成回合：检查前置条件，调用推理引擎，
// 累积流式增量，再把结果写回会话。生成失败时写入兜底回复，
// 会话总是停在一个可重放的一致状态。

mod error;
mod state;

pub use error::ConversationError;
pub use state::{ConversationState, PendingReply, TurnKind};

use futures::StreamExt;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{
    AppendMessageCommand, AppendMessageHandler, CommandHandler, EditMessageCommand,
    EditMessageHandler,
};
use crate::infrastructure::{AppEvent, EventBus};
use crate::modules::chat::domain::{
    ChatMessage, ChatSession, ContextBuilder, Message, MessageId, SessionId,
};
use crate::modules::chat::infrastructure::EngineHandle;
use crate::modules::chat::ports::InferenceError;
use crate::modules::config::ConversationConfig;
use crate::modules::persona::domain::{PersonaId, PromptCompiler};
use crate::modules::persona::ports::PersonaRepository;
use crate::shared::ErrorCode;
use state::TurnSlot;

/// 一次生成回合的结果
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// 回复已落盘
    Replied(Message),
    /// 模型没有产出文本，占位消息被丢弃，没有落盘
    Empty,
    /// 生成失败，落盘的是兜底回复
    Fallback { message: Message, error: String },
}

impl TurnOutcome {
    /// 本回合落盘的 bot 消息
    pub fn message(&self) -> Option<&Message> {
        match self {
            TurnOutcome::Replied(message) | TurnOutcome::Fallback { message, .. } => Some(message),
            TurnOutcome::Empty => None,
        }
    }
}

/// 单个角色的对话编排器
pub struct Conversation {
    persona_id: PersonaId,
    engine: Arc<EngineHandle>,
    events: Arc<EventBus>,
    config: ConversationConfig,
    repository: Arc<dyn PersonaRepository>,
    append_handler: AppendMessageHandler,
    edit_handler: EditMessageHandler,
    compiler: PromptCompiler,
    slot: TurnSlot,
}

impl Conversation {
    pub fn new(
        persona_id: PersonaId,
        repository: Arc<dyn PersonaRepository>,
        engine: Arc<EngineHandle>,
        events: Arc<EventBus>,
        config: ConversationConfig,
    ) -> Self {
        Self {
            persona_id,
            engine,
            events,
            config,
            append_handler: AppendMessageHandler::new(repository.clone()),
            edit_handler: EditMessageHandler::new(repository.clone()),
            repository,
            compiler: PromptCompiler::default(),
            slot: TurnSlot::new(),
        }
    }

    pub fn persona_id(&self) -> PersonaId {
        self.persona_id
    }

    pub fn state(&self) -> ConversationState {
        self.slot.state()
    }

    /// 正在流式生成的占位消息
    pub fn pending_reply(&self) -> Option<PendingReply> {
        self.slot.pending()
    }

    /// 发送一条用户消息并生成回复
    pub async fn send_message(
        &self,
        session_id: SessionId,
        input: &str,
    ) -> Result<TurnOutcome, ConversationError> {
        self.ensure_ready()?;
        if input.trim().is_empty() {
            return Err(ConversationError::EmptyInput);
        }
        let _turn = self
            .slot
            .try_begin(TurnKind::Reply)
            .ok_or(ConversationError::Busy)?;

        self.append_handler
            .handle(AppendMessageCommand::new(
                self.persona_id,
                session_id,
                input,
                true,
            ))
            .await?;

        let (builder, session) = self.load_turn(session_id).await?;
        let context = builder.build(session.messages());

        self.generate(session_id, TurnKind::Reply, context, &self.config.reply_fallback)
            .await
    }

    /// 为空会话生成问候，不落盘任何用户消息
    pub async fn greet(&self, session_id: SessionId) -> Result<TurnOutcome, ConversationError> {
        self.ensure_ready()?;
        let _turn = self
            .slot
            .try_begin(TurnKind::Greeting)
            .ok_or(ConversationError::Busy)?;

        let (builder, session) = self.load_turn(session_id).await?;
        if !session.is_empty() {
            return Err(ConversationError::GreetingNotApplicable);
        }
        let context = builder.build_greeting(self.config.greeting_instruction.clone());

        self.generate(
            session_id,
            TurnKind::Greeting,
            context,
            &self.config.greeting_fallback,
        )
        .await
    }

    /// 编辑用户消息并重新生成回复
    ///
    /// 编辑失败时直接返回错误，不会发起生成
    pub async fn edit_message(
        &self,
        session_id: SessionId,
        message_id: MessageId,
        content: &str,
    ) -> Result<TurnOutcome, ConversationError> {
        self.ensure_ready()?;
        if content.trim().is_empty() {
            return Err(ConversationError::EmptyInput);
        }
        let _turn = self
            .slot
            .try_begin(TurnKind::EditReply)
            .ok_or(ConversationError::Busy)?;

        self.edit_handler
            .handle(EditMessageCommand::new(
                self.persona_id,
                session_id,
                message_id,
                content,
            ))
            .await
            .inspect_err(|e| warn!("[Conversation] Edit of message {} failed: {}", message_id, e))?;

        let (builder, session) = self.load_turn(session_id).await?;
        let context = builder.build(session.messages());

        self.generate(
            session_id,
            TurnKind::EditReply,
            context,
            &self.config.edit_fallback,
        )
        .await
    }

    fn ensure_ready(&self) -> Result<(), ConversationError> {
        if self.engine.is_ready() {
            Ok(())
        } else {
            Err(ConversationError::EngineNotReady)
        }
    }

    /// 读取落盘后的会话，并为当前角色编译系统提示词
    async fn load_turn(
        &self,
        session_id: SessionId,
    ) -> Result<(ContextBuilder, ChatSession), ConversationError> {
        let personas = self
            .repository
            .load_all()
            .await
            .map_err(|e| ConversationError::Storage(e.to_string()))?;
        let persona = personas
            .iter()
            .find(|p| p.id() == self.persona_id)
            .ok_or(ConversationError::PersonaNotFound(self.persona_id))?;
        let session = persona
            .chat(session_id)
            .cloned()
            .ok_or(ConversationError::SessionNotFound(session_id))?;

        let builder = ContextBuilder::new(self.compiler.compile(persona))
            .with_per_role_limit(self.config.per_role_limit);
        Ok((builder, session))
    }

    async fn generate(
        &self,
        session_id: SessionId,
        kind: TurnKind,
        context: Vec<ChatMessage>,
        fallback: &str,
    ) -> Result<TurnOutcome, ConversationError> {
        self.slot.open_placeholder(session_id, kind);
        self.events.publish(AppEvent::ReplyStarted {
            persona_id: self.persona_id,
            session_id,
            kind,
        });

        let streamed = self.stream_reply(session_id, context).await;
        self.slot.discard_placeholder();

        match streamed {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    info!("[Conversation] Empty reply in session {}, nothing stored", session_id);
                    self.events.publish(AppEvent::ReplyCompleted {
                        persona_id: self.persona_id,
                        session_id,
                        message_id: None,
                    });
                    return Ok(TurnOutcome::Empty);
                }

                let message = self.append_bot_message(session_id, text).await?;
                self.events.publish(AppEvent::ReplyCompleted {
                    persona_id: self.persona_id,
                    session_id,
                    message_id: Some(message.id()),
                });
                Ok(TurnOutcome::Replied(message))
            }
            Err(e) => {
                error!("[Conversation] Generation failed in session {}: {}", session_id, e);
                self.events.publish(AppEvent::ReplyFailed {
                    persona_id: self.persona_id,
                    session_id,
                    code: ErrorCode::GenerationError,
                    error: e.to_string(),
                });

                let message = self
                    .append_bot_message(session_id, fallback)
                    .await
                    .inspect_err(|err| {
                        error!(
                            "[Conversation] Failed to store fallback reply in session {}, turn left without a reply: {}",
                            session_id, err
                        )
                    })?;
                Ok(TurnOutcome::Fallback {
                    message,
                    error: e.to_string(),
                })
            }
        }
    }

    /// 消费增量流，逐块更新占位消息并广播
    async fn stream_reply(
        &self,
        session_id: SessionId,
        context: Vec<ChatMessage>,
    ) -> Result<String, InferenceError> {
        let mut stream = self.engine.chat_stream(context).await?;
        let mut content = String::new();

        while let Some(chunk) = stream.next().await {
            let Some(delta) = chunk?.content.filter(|d| !d.is_empty()) else {
                continue;
            };
            content.push_str(&delta);
            self.slot.update_placeholder(&content);
            self.events.publish(AppEvent::ReplyChunk {
                persona_id: self.persona_id,
                session_id,
                delta,
                content: content.clone(),
            });
        }

        Ok(content)
    }

    async fn append_bot_message(
        &self,
        session_id: SessionId,
        content: &str,
    ) -> Result<Message, ConversationError> {
        Ok(self
            .append_handler
            .handle(AppendMessageCommand::new(
                self.persona_id,
                session_id,
                content,
                false,
            ))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::MessageRole;
    use crate::modules::chat::infrastructure::{MockInferenceEngine, MockReply};
    use crate::modules::persona::domain::{Persona, PersonaForm};
    use crate::modules::persona::infrastructure::{
        InMemoryKeyValueStore, KeyValuePersonaRepository, DEFAULT_NAMESPACE,
    };
    use std::time::Duration;
    use tokio::sync::Notify;

    struct Fixture {
        store: Arc<InMemoryKeyValueStore>,
        repo: Arc<dyn PersonaRepository>,
        engine: Arc<MockInferenceEngine>,
        events: Arc<EventBus>,
        conversation: Arc<Conversation>,
        session_id: SessionId,
    }

    impl Fixture {
        async fn new(engine: MockInferenceEngine) -> Self {
            let fixture = Self::not_ready(engine).await;
            fixture.conversation.engine.initialize().await.unwrap();
            fixture
        }

        async fn not_ready(engine: MockInferenceEngine) -> Self {
            let store = Arc::new(InMemoryKeyValueStore::new());
            let repo: Arc<dyn PersonaRepository> = Arc::new(KeyValuePersonaRepository::new(
                store.clone(),
                DEFAULT_NAMESPACE,
            ));
            let mut persona = Persona::new(PersonaForm::new().with_answer("name", "Alex"));
            let session = ChatSession::new();
            let session_id = session.id();
            persona.prepend_chat(session);
            repo.save_all(std::slice::from_ref(&persona)).await.unwrap();

            let engine = Arc::new(engine);
            let handle = Arc::new(EngineHandle::new(engine.clone(), "mock-model"));
            let events = Arc::new(EventBus::new());
            let conversation = Arc::new(Conversation::new(
                persona.id(),
                repo.clone(),
                handle,
                events.clone(),
                ConversationConfig::default(),
            ));

            Self {
                store,
                repo,
                engine,
                events,
                conversation,
                session_id,
            }
        }

        async fn messages(&self) -> Vec<Message> {
            let personas = self.repo.load_all().await.unwrap();
            personas[0]
                .chat(self.session_id)
                .map(|s| s.messages().to_vec())
                .unwrap_or_default()
        }
    }

    #[tokio::test]
    async fn test_send_message_stores_trimmed_reply() {
        let fx = Fixture::new(
            MockInferenceEngine::new().with_replies([MockReply::text(&["  Hi", " there! "])]),
        )
        .await;

        let outcome = fx.conversation.send_message(fx.session_id, "Hello").await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Replied(_)));
        let messages = fx.messages().await;
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_user());
        assert_eq!(messages[0].content(), "Hello");
        assert_eq!(messages[1].content(), "Hi there!");
        assert_eq!(fx.conversation.state(), ConversationState::Idle);
        assert!(fx.conversation.pending_reply().is_none());
    }

    #[tokio::test]
    async fn test_context_is_built_after_user_message_without_placeholder() {
        let fx = Fixture::new(MockInferenceEngine::new()).await;

        fx.conversation.send_message(fx.session_id, "Hello").await.unwrap();

        let requests = fx.engine.requests();
        assert_eq!(requests.len(), 1);
        let roles: Vec<_> = requests[0].messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::System, MessageRole::User]);
        assert!(requests[0].messages[0].content.contains("You are now roleplaying as Alex."));
        assert_eq!(requests[0].messages[1].content, "Hello");
    }

    #[tokio::test]
    async fn test_send_rejects_blank_input_and_unready_engine() {
        let fx = Fixture::not_ready(MockInferenceEngine::new()).await;
        let result = fx.conversation.send_message(fx.session_id, "Hello").await;
        assert!(matches!(result, Err(ConversationError::EngineNotReady)));

        fx.conversation.engine.initialize().await.unwrap();
        let result = fx.conversation.send_message(fx.session_id, "   ").await;
        assert!(matches!(result, Err(ConversationError::EmptyInput)));

        assert!(fx.messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_send_to_unknown_session() {
        let fx = Fixture::new(MockInferenceEngine::new()).await;

        let result = fx.conversation.send_message(SessionId::new(), "Hello").await;

        assert!(matches!(result, Err(ConversationError::SessionNotFound(_))));
        assert!(fx.engine.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_stream_stores_fallback() {
        let fx = Fixture::new(
            MockInferenceEngine::new().with_replies([MockReply::FailToOpen("offline".to_string())]),
        )
        .await;
        let mut rx = fx.events.subscribe();

        let outcome = fx.conversation.send_message(fx.session_id, "Hello").await.unwrap();

        let TurnOutcome::Fallback { message, error } = outcome else {
            panic!("expected fallback");
        };
        assert_eq!(message.content(), "Sorry, I encountered an error trying to respond.");
        assert!(error.contains("offline"));

        let messages = fx.messages().await;
        assert_eq!(messages.len(), 2);
        assert!(!messages[1].is_user());

        assert!(matches!(rx.recv().await.unwrap(), AppEvent::ReplyStarted { .. }));
        match rx.recv().await.unwrap() {
            AppEvent::ReplyFailed { code, .. } => assert_eq!(code, ErrorCode::GenerationError),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fallback_write_failure_is_reported() {
        let gate = Arc::new(Notify::new());
        let fx = Fixture::new(
            MockInferenceEngine::new()
                .with_gate(gate.clone())
                .with_replies([MockReply::FailAfter {
                    chunks: Vec::new(),
                    error: "connection reset".to_string(),
                }]),
        )
        .await;

        let conversation = fx.conversation.clone();
        let session_id = fx.session_id;
        let turn = tokio::spawn(async move { conversation.send_message(session_id, "Hello").await });

        while fx.conversation.pending_reply().is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        fx.store.set_fail_writes(true);
        gate.notify_one();

        let result = turn.await.unwrap();
        assert!(matches!(result, Err(ConversationError::Storage(_))));
        assert_eq!(fx.conversation.state(), ConversationState::Idle);

        let messages = fx.messages().await;
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_user());
    }

    #[tokio::test]
    async fn test_mid_stream_failure_discards_partial_text() {
        let fx = Fixture::new(MockInferenceEngine::new().with_replies([MockReply::FailAfter {
            chunks: vec!["Half a".to_string()],
            error: "connection reset".to_string(),
        }]))
        .await;

        let outcome = fx.conversation.send_message(fx.session_id, "Hello").await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Fallback { .. }));
        let messages = fx.messages().await;
        assert_eq!(
            messages[1].content(),
            "Sorry, I encountered an error trying to respond."
        );
        assert!(messages.iter().all(|m| m.content() != "Half a"));
    }

    #[tokio::test]
    async fn test_empty_reply_stores_nothing() {
        let fx = Fixture::new(MockInferenceEngine::new().with_replies([MockReply::text(&["  ", "\n"])]))
            .await;

        let outcome = fx.conversation.send_message(fx.session_id, "Hello").await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Empty));
        let messages = fx.messages().await;
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_user());
    }

    #[tokio::test]
    async fn test_chunks_are_published_with_running_content() {
        let fx = Fixture::new(MockInferenceEngine::new().with_replies([MockReply::text(&["Hel", "lo"])]))
            .await;
        let mut rx = fx.events.subscribe();

        fx.conversation.send_message(fx.session_id, "Hi").await.unwrap();

        let mut contents = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::ReplyChunk { content, .. } = event {
                contents.push(content);
            }
        }
        assert_eq!(contents, vec!["Hel".to_string(), "Hello".to_string()]);
    }

    #[tokio::test]
    async fn test_greeting_stores_one_bot_message() {
        let fx = Fixture::new(
            MockInferenceEngine::new().with_replies([MockReply::text(&["Hey, I'm Alex."])]),
        )
        .await;

        let outcome = fx.conversation.greet(fx.session_id).await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Replied(_)));
        let messages = fx.messages().await;
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].is_user());

        let request = &fx.engine.requests()[0];
        assert_eq!(request.messages.len(), 2);
        assert_eq!(
            request.messages[1].content,
            ConversationConfig::default().greeting_instruction
        );
    }

    #[tokio::test]
    async fn test_greeting_requires_empty_session() {
        let fx = Fixture::new(MockInferenceEngine::new()).await;
        fx.conversation.send_message(fx.session_id, "Hello").await.unwrap();

        let result = fx.conversation.greet(fx.session_id).await;
        assert!(matches!(result, Err(ConversationError::GreetingNotApplicable)));
    }

    #[tokio::test]
    async fn test_greeting_failure_uses_greeting_fallback() {
        let fx = Fixture::new(
            MockInferenceEngine::new().with_replies([MockReply::FailToOpen("offline".to_string())]),
        )
        .await;

        fx.conversation.greet(fx.session_id).await.unwrap();

        let messages = fx.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content(), "Hello! I'm ready to chat.");
    }

    #[tokio::test]
    async fn test_edit_prunes_reply_and_regenerates() {
        let fx = Fixture::new(MockInferenceEngine::new().with_replies([
            MockReply::text(&["First answer"]),
            MockReply::text(&["Second answer"]),
        ]))
        .await;
        fx.conversation.send_message(fx.session_id, "Question").await.unwrap();
        let user_id = fx.messages().await[0].id();

        let outcome = fx
            .conversation
            .edit_message(fx.session_id, user_id, "Better question")
            .await
            .unwrap();

        assert!(matches!(outcome, TurnOutcome::Replied(_)));
        let messages = fx.messages().await;
        let contents: Vec<_> = messages.iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["Better question", "Second answer"]);

        // 重新生成的上下文里已经没有旧回复
        let request = &fx.engine.requests()[1];
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].content, "Better question");
    }

    #[tokio::test]
    async fn test_edit_of_bot_message_aborts_without_generation() {
        let fx = Fixture::new(MockInferenceEngine::new()).await;
        fx.conversation.send_message(fx.session_id, "Question").await.unwrap();
        let bot_id = fx.messages().await[1].id();

        let result = fx.conversation.edit_message(fx.session_id, bot_id, "Hacked").await;

        assert!(matches!(result, Err(ConversationError::EditFailed(_))));
        assert_eq!(fx.engine.requests().len(), 1);
        assert_eq!(fx.messages().await.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_turn_is_rejected_while_busy() {
        let gate = Arc::new(Notify::new());
        let fx = Fixture::new(MockInferenceEngine::new().with_gate(gate.clone())).await;

        let conversation = fx.conversation.clone();
        let session_id = fx.session_id;
        let first = tokio::spawn(async move { conversation.send_message(session_id, "One").await });

        while fx.conversation.pending_reply().is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(fx.conversation.state(), ConversationState::Sending);

        let second = fx.conversation.send_message(fx.session_id, "Two").await;
        assert!(matches!(second, Err(ConversationError::Busy)));
        let greeting = fx.conversation.greet(fx.session_id).await;
        assert!(matches!(greeting, Err(ConversationError::Busy)));

        gate.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert!(matches!(outcome, TurnOutcome::Replied(_)));
        assert_eq!(fx.conversation.state(), ConversationState::Idle);
        assert_eq!(fx.messages().await.len(), 2);
    }
}
