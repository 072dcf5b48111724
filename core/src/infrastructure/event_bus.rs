use serde::Serialize;
use tokio::sync::broadcast;

use crate::modules::chat::domain::{MessageId, SessionId};
use crate::modules::chat::TurnKind;
use crate::modules::persona::domain::PersonaId;
use crate::shared::ErrorCode;

/// 应用事件
///
/// 观察者据此增量渲染流式占位消息
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AppEvent {
    ReplyStarted {
        persona_id: PersonaId,
        session_id: SessionId,
        kind: TurnKind,
    },
    ReplyChunk {
        persona_id: PersonaId,
        session_id: SessionId,
        /// 本次增量
        delta: String,
        /// 目前累计的全文
        content: String,
    },
    ReplyCompleted {
        persona_id: PersonaId,
        session_id: SessionId,
        /// 产出为空时没有落盘消息
        message_id: Option<MessageId>,
    },
    ReplyFailed {
        persona_id: PersonaId,
        session_id: SessionId,
        code: ErrorCode,
        error: String,
    },
}

pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    pub fn publish(&self, event: AppEvent) {
        match &event {
            AppEvent::ReplyChunk { .. } => {}
            AppEvent::ReplyFailed { error, .. } => {
                tracing::error!("[EventBus] Reply failed: {}", error)
            }
            _ => tracing::debug!("[EventBus] Publishing event: {:?}", event),
        }
        // 没有订阅者时发送失败，忽略即可
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
