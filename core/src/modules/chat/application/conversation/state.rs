use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

use crate::modules::chat::domain::SessionId;

/// 生成回合的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnKind {
    /// 普通回复
    Reply,
    /// 新会话的问候
    Greeting,
    /// 编辑后重新生成
    EditReply,
}

/// 对话状态
///
/// 同一角色同一时间只允许一种生成处于活动状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConversationState {
    Idle,
    Sending,
    Greeting,
    EditingReply,
}

impl From<TurnKind> for ConversationState {
    fn from(kind: TurnKind) -> Self {
        match kind {
            TurnKind::Reply => ConversationState::Sending,
            TurnKind::Greeting => ConversationState::Greeting,
            TurnKind::EditReply => ConversationState::EditingReply,
        }
    }
}

/// 流式占位消息快照，只存在于内存中，从不落盘
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReply {
    pub session_id: SessionId,
    pub kind: TurnKind,
    /// 目前累计的文本
    pub content: String,
}

#[derive(Debug)]
struct Slot {
    state: ConversationState,
    pending: Option<PendingReply>,
}

/// 对话状态槽
#[derive(Debug)]
pub(super) struct TurnSlot {
    inner: Mutex<Slot>,
}

impl TurnSlot {
    pub(super) fn new() -> Self {
        Self {
            inner: Mutex::new(Slot {
                state: ConversationState::Idle,
                pending: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // 锁内不会 panic，中毒时直接沿用内部数据
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(super) fn state(&self) -> ConversationState {
        self.lock().state
    }

    pub(super) fn pending(&self) -> Option<PendingReply> {
        self.lock().pending.clone()
    }

    /// 从 Idle 进入 `kind` 对应的状态；已有活动回合时返回 None
    pub(super) fn try_begin(&self, kind: TurnKind) -> Option<TurnGuard<'_>> {
        let mut slot = self.lock();
        if slot.state != ConversationState::Idle {
            return None;
        }
        slot.state = kind.into();
        Some(TurnGuard { slot: self })
    }

    pub(super) fn open_placeholder(&self, session_id: SessionId, kind: TurnKind) {
        self.lock().pending = Some(PendingReply {
            session_id,
            kind,
            content: String::new(),
        });
    }

    pub(super) fn update_placeholder(&self, content: &str) {
        if let Some(pending) = self.lock().pending.as_mut() {
            pending.content.clear();
            pending.content.push_str(content);
        }
    }

    pub(super) fn discard_placeholder(&self) {
        self.lock().pending = None;
    }
}

/// 活动回合的守卫，释放时回到 Idle 并丢弃占位消息
pub(super) struct TurnGuard<'a> {
    slot: &'a TurnSlot,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        slot.state = ConversationState::Idle;
        slot.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_one_turn_at_a_time() {
        let slot = TurnSlot::new();

        let guard = slot.try_begin(TurnKind::Reply).unwrap();
        assert_eq!(slot.state(), ConversationState::Sending);
        assert!(slot.try_begin(TurnKind::Greeting).is_none());

        drop(guard);
        assert_eq!(slot.state(), ConversationState::Idle);
        assert!(slot.try_begin(TurnKind::EditReply).is_some());
    }

    #[test]
    fn test_guard_drop_clears_placeholder() {
        let slot = TurnSlot::new();
        let session_id = SessionId::new();

        {
            let _guard = slot.try_begin(TurnKind::Greeting).unwrap();
            slot.open_placeholder(session_id, TurnKind::Greeting);
            slot.update_placeholder("Hel");
            slot.update_placeholder("Hello");
            assert_eq!(slot.pending().unwrap().content, "Hello");
        }

        assert!(slot.pending().is_none());
    }
}
