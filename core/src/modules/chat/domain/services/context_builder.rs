use serde::{Deserialize, Serialize};

use super::super::entities::{Message, MessageRole};

/// 每种角色默认保留的历史条数
pub const DEFAULT_PER_ROLE_LIMIT: usize = 2;

/// 上下文构建器
///
/// 领域服务：把完整消息历史缩减为固定大小的模型输入窗口。
/// 从最新往最旧扫描，用户消息与 bot 消息各自最多收集 `per_role_limit` 条，
/// 再恢复为时间顺序，并在最前面放入系统提示词。
/// 只按条数限制，不考虑长度。
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    /// 每种角色最多保留的消息数
    per_role_limit: usize,
    /// 系统提示词
    system_prompt: String,
}

impl ContextBuilder {
    /// 创建上下文构建器（默认每种角色 2 条）
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            per_role_limit: DEFAULT_PER_ROLE_LIMIT,
            system_prompt: system_prompt.into(),
        }
    }

    /// 设置每种角色的保留条数
    pub fn with_per_role_limit(mut self, per_role_limit: usize) -> Self {
        self.per_role_limit = per_role_limit;
        self
    }

    pub fn per_role_limit(&self) -> usize {
        self.per_role_limit
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// 构建上下文消息列表
    ///
    /// `history` 不能包含尚未落盘的流式占位消息，调用方负责排除
    pub fn build(&self, history: &[Message]) -> Vec<ChatMessage> {
        let mut users = 0;
        let mut bots = 0;
        let mut picked: Vec<&Message> = Vec::with_capacity(self.per_role_limit * 2);

        for msg in history.iter().rev() {
            if users >= self.per_role_limit && bots >= self.per_role_limit {
                break;
            }
            let quota = if msg.is_user() { &mut users } else { &mut bots };
            if *quota < self.per_role_limit {
                *quota += 1;
                picked.push(msg);
            }
        }

        let mut context = Vec::with_capacity(picked.len() + 1);
        context.push(ChatMessage::system(self.system_prompt.clone()));
        context.extend(picked.into_iter().rev().map(ChatMessage::from));
        context
    }

    /// 构建问候上下文：系统提示词加一条合成的指令消息
    pub fn build_greeting(&self, instruction: impl Into<String>) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(instruction),
        ]
    }
}

/// 函数式入口，等价于 `ContextBuilder::new(..).with_per_role_limit(..).build(..)`
pub fn build_context(
    messages: &[Message],
    system_prompt: &str,
    per_role_limit: usize,
) -> Vec<ChatMessage> {
    ContextBuilder::new(system_prompt)
        .with_per_role_limit(per_role_limit)
        .build(messages)
}

/// 模型请求消息格式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role(),
            content: msg.content().to_string(),
        }
    }
}
