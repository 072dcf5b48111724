use async_trait::async_trait;
use futures::stream;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use crate::modules::chat::ports::{
    CompletionRequest, DeltaStream, InferenceEngine, InferenceError, InitProgress,
    ProgressCallback, StreamChunk,
};

/// 预设的一次回复
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 依次产出的增量文本
    Chunks(Vec<String>),
    /// 打开流时直接失败
    FailToOpen(String),
    /// 产出若干增量后中途失败
    FailAfter { chunks: Vec<String>, error: String },
}

impl MockReply {
    pub fn text(chunks: &[&str]) -> Self {
        MockReply::Chunks(chunks.iter().map(|c| c.to_string()).collect())
    }
}

#[derive(Default)]
struct MockState {
    replies: VecDeque<MockReply>,
    load_failures: u32,
    requests: Vec<CompletionRequest>,
}

/// 模拟推理引擎
///
/// 用于测试或没有本地推理服务时的回退。
/// 预设回复用完后，回复内容会复述最后一条输入。
#[derive(Default)]
pub struct MockInferenceEngine {
    state: Mutex<MockState>,
    load_calls: AtomicUsize,
    load_delay: Duration,
    gate: Option<Arc<Notify>>,
}

impl MockInferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加预设回复
    pub fn with_replies(self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.replies.extend(replies);
        }
        self
    }

    /// 前 `times` 次加载失败
    pub fn with_load_failures(self, times: u32) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.load_failures = times;
        }
        self
    }

    /// 加载耗时
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// 每个流在产出第一个块之前等待 `gate` 放行
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// 运行时追加回复
    pub fn push_reply(&self, reply: MockReply) {
        if let Ok(mut state) = self.state.lock() {
            state.replies.push_back(reply);
        }
    }

    /// `load` 被调用的次数
    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    /// 收到的全部请求
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.state
            .lock()
            .map(|s| s.requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl InferenceEngine for MockInferenceEngine {
    fn engine_id(&self) -> &str {
        "mock"
    }

    async fn load(&self, model: &str, on_progress: ProgressCallback) -> Result<(), InferenceError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        on_progress(InitProgress::new(0.0, format!("Loading {}", model)));

        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay / 2).await;
            on_progress(InitProgress::new(0.5, format!("Loading {}", model)));
            tokio::time::sleep(self.load_delay / 2).await;
        }

        let fail = match self.state.lock() {
            Ok(mut state) if state.load_failures > 0 => {
                state.load_failures -= 1;
                true
            }
            _ => false,
        };
        if fail {
            return Err(InferenceError::LoadFailed("mock load failure".to_string()));
        }

        on_progress(InitProgress::new(1.0, "Finish loading"));
        Ok(())
    }

    async fn chat_stream(&self, request: CompletionRequest) -> Result<DeltaStream, InferenceError> {
        let last_input = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let reply = {
            let mut state = self
                .state
                .lock()
                .map_err(|e| InferenceError::Unknown(e.to_string()))?;
            state.requests.push(request);
            state.replies.pop_front()
        };

        let reply = reply.unwrap_or_else(|| {
            MockReply::Chunks(vec!["I hear you: ".to_string(), last_input])
        });

        let items: Vec<Result<StreamChunk, InferenceError>> = match reply {
            MockReply::FailToOpen(error) => return Err(InferenceError::Network(error)),
            MockReply::Chunks(chunks) => chunks.into_iter().map(|c| Ok(StreamChunk::text(c))).collect(),
            MockReply::FailAfter { chunks, error } => chunks
                .into_iter()
                .map(|c| Ok(StreamChunk::text(c)))
                .chain(std::iter::once(Err(InferenceError::Stream(error))))
                .collect(),
        };

        let gate = self.gate.clone();
        let stream = stream::unfold((items.into_iter(), gate), |(mut items, gate)| async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            items.next().map(|item| (item, (items, None)))
        });

        Ok(Box::pin(stream))
    }
}
