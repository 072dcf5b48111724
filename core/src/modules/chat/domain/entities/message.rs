use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::value_objects::MessageId;

/// 模型输入中的消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// 用户消息
    User,
    /// AI 助手消息
    Assistant,
    /// 系统消息
    System,
}

impl MessageRole {
    /// 转换为 OpenAI 格式的角色名
    pub fn to_openai_role(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

/// 消息实体
///
/// 属于 ChatSession，会话内按插入顺序排列。
/// 顺序本身有意义：用户消息之后紧跟的非用户消息被视为它的回复。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// 消息唯一标识
    id: MessageId,
    /// 消息内容
    content: String,
    /// 创建（或最近一次编辑）时间
    timestamp: DateTime<Utc>,
    /// 是否为用户消息
    is_user: bool,
}

impl Message {
    /// 创建消息
    pub fn new(content: impl Into<String>, is_user: bool) -> Self {
        Self {
            id: MessageId::new(),
            content: content.into(),
            timestamp: Utc::now(),
            is_user,
        }
    }

    /// 创建用户消息
    pub fn new_user(content: impl Into<String>) -> Self {
        Self::new(content, true)
    }

    /// 创建 bot 消息
    pub fn new_bot(content: impl Into<String>) -> Self {
        Self::new(content, false)
    }

    // Getters
    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_user(&self) -> bool {
        self.is_user
    }

    pub fn role(&self) -> MessageRole {
        if self.is_user {
            MessageRole::User
        } else {
            MessageRole::Assistant
        }
    }

    /// 覆盖内容并刷新时间戳（仅编辑流程使用）
    pub(crate) fn rewrite(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.timestamp = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_message() {
        let msg = Message::new_user("Hello there");

        assert!(msg.is_user());
        assert_eq!(msg.role(), MessageRole::User);
        assert_eq!(msg.content(), "Hello there");
    }

    #[test]
    fn test_bot_message_role() {
        let msg = Message::new_bot("Hi!");
        assert!(!msg.is_user());
        assert_eq!(msg.role().to_openai_role(), "assistant");
    }

    #[test]
    fn test_serialized_shape() {
        let msg = Message::new_user("ping");
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["content"], "ping");
        assert_eq!(json["isUser"], true);
        assert!(json["timestamp"].is_string());
        assert!(json["id"].is_string());
    }

    #[test]
    fn test_rewrite_updates_timestamp() {
        let mut msg = Message::new_user("before");
        let old = msg.timestamp();
        std::thread::sleep(std::time::Duration::from_millis(5));

        msg.rewrite("after");
        assert_eq!(msg.content(), "after");
        assert!(msg.timestamp() > old);
    }
}
