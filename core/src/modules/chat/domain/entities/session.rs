use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::super::value_objects::{MessageId, SessionId};
use super::Message;

/// 编辑消息失败的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("Message is not a user message: {0}")]
    NotAUserMessage(MessageId),
}

/// 聊天会话实体
///
/// 由 Persona 独占持有，消息按插入顺序保存
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// 会话唯一标识
    id: SessionId,
    /// 会话名称
    name: String,
    /// 创建时间
    created_at: DateTime<Utc>,
    /// 消息列表
    #[serde(default)]
    messages: Vec<Message>,
}

impl ChatSession {
    /// 创建新会话，名称取自创建时间
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            name: Self::default_name(now),
            created_at: now,
            messages: Vec::new(),
        }
    }

    /// 默认会话名："Chat - 日期 时间"（本地时区）
    pub fn default_name(created_at: DateTime<Utc>) -> String {
        format!(
            "Chat - {}",
            created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        )
    }

    // Getters
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    // 业务方法

    /// 重命名会话，去除首尾空白后为空则拒绝
    pub fn rename(&mut self, new_name: &str) -> bool {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.name = trimmed.to_string();
        true
    }

    /// 追加消息
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// 改写一条用户消息，并删除紧随其后的那条 bot 回复（如果有）
    ///
    /// 这是基于位置的配对：只看下一条消息，且最多删除一条。
    /// 返回是否删除了回复。
    pub fn edit_user_message_and_prune_reply(
        &mut self,
        message_id: MessageId,
        new_content: impl Into<String>,
    ) -> Result<bool, EditError> {
        let index = self
            .messages
            .iter()
            .position(|m| m.id() == message_id)
            .ok_or(EditError::MessageNotFound(message_id))?;

        if !self.messages[index].is_user() {
            return Err(EditError::NotAUserMessage(message_id));
        }

        self.messages[index].rewrite(new_content);

        let next = index + 1;
        let prune = self.messages.get(next).is_some_and(|m| !m.is_user());
        if prune {
            self.messages.remove(next);
        }

        Ok(prune)
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
