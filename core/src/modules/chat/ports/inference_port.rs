use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

use crate::modules::chat::domain::ChatMessage;

/// 推理错误类型
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {code} - {message}")]
    Api { code: String, message: String },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Engine not ready")]
    NotReady,

    #[error("Failed to load model: {0}")]
    LoadFailed(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// 初始化进度报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitProgress {
    /// 0.0 ~ 1.0
    pub progress: f64,
    pub text: String,
}

impl InitProgress {
    pub fn new(progress: f64, text: impl Into<String>) -> Self {
        Self {
            progress,
            text: text.into(),
        }
    }
}

/// 初始化进度回调
pub type ProgressCallback = Arc<dyn Fn(InitProgress) + Send + Sync>;

/// 补全请求
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// 有序的上下文消息，第一条为系统提示词
    pub messages: Vec<ChatMessage>,
    /// 模型 ID
    pub model: String,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>, model: impl Into<String>) -> Self {
        Self {
            messages,
            model: model.into(),
        }
    }
}

/// 流式增量块
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// 增量文本，可能为空
    pub content: Option<String>,
}

impl StreamChunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }
}

/// 增量流：有限、不可重启，以结束或一个错误终止
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, InferenceError>> + Send>>;

/// 推理引擎端口
///
/// 所有推理后端适配器都必须实现此 trait
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// 引擎标识
    fn engine_id(&self) -> &str;

    /// 加载模型，期间通过回调报告进度
    async fn load(&self, model: &str, on_progress: ProgressCallback)
        -> Result<(), InferenceError>;

    /// 流式对话补全
    async fn chat_stream(&self, request: CompletionRequest) -> Result<DeltaStream, InferenceError>;
}
