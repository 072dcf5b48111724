// 推理引擎生命周期
//
// 进程内唯一的推理引擎句柄：Uninitialized -> Initializing -> Ready | Failed。
// 状态通过 watch 通道广播，同一时间最多一次初始化在进行，
// 并发的初始化请求等待同一次尝试的结果。

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

use crate::modules::chat::domain::ChatMessage;
use crate::modules::chat::ports::{
    CompletionRequest, DeltaStream, InferenceEngine, InferenceError, InitProgress,
    ProgressCallback,
};

/// 引擎阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EnginePhase {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// 引擎状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub phase: EnginePhase,
    /// 百分比 0 ~ 100
    pub progress: f64,
    pub text: String,
}

impl EngineStatus {
    fn uninitialized() -> Self {
        Self {
            phase: EnginePhase::Uninitialized,
            progress: 0.0,
            text: String::new(),
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.phase, EnginePhase::Ready | EnginePhase::Failed)
    }
}

/// 推理引擎句柄
pub struct EngineHandle {
    engine: Arc<dyn InferenceEngine>,
    model_id: String,
    status: Arc<watch::Sender<EngineStatus>>,
}

impl EngineHandle {
    pub fn new(engine: Arc<dyn InferenceEngine>, model_id: impl Into<String>) -> Self {
        let (status, _) = watch::channel(EngineStatus::uninitialized());
        Self {
            engine,
            model_id: model_id.into(),
            status: Arc::new(status),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// 当前状态
    pub fn status(&self) -> EngineStatus {
        self.status.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.status.borrow().phase == EnginePhase::Ready
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<EngineStatus> {
        self.status.subscribe()
    }

    /// 初始化引擎
    ///
    /// 已就绪时直接返回；正在初始化时等待同一次尝试；
    /// 失败后可以再次调用重试。加载在后台任务中进行，调用方放弃等待不会中断它。
    pub async fn initialize(&self) -> Result<(), InferenceError> {
        let mut claimed = false;
        self.status.send_if_modified(|s| match s.phase {
            EnginePhase::Uninitialized | EnginePhase::Failed => {
                *s = EngineStatus {
                    phase: EnginePhase::Initializing,
                    progress: 0.0,
                    text: "Initializing AI...".to_string(),
                };
                claimed = true;
                true
            }
            EnginePhase::Initializing | EnginePhase::Ready => false,
        });

        if claimed {
            info!("[EngineHandle] Loading model {}", self.model_id);
            self.spawn_load();
        }

        self.wait_until_settled().await
    }

    fn spawn_load(&self) {
        let engine = self.engine.clone();
        let model_id = self.model_id.clone();
        let status = self.status.clone();

        let progress_status = status.clone();
        let on_progress: ProgressCallback = Arc::new(move |report: InitProgress| {
            progress_status.send_modify(|s| {
                if s.phase == EnginePhase::Initializing {
                    s.progress = (report.progress * 100.0).clamp(0.0, 100.0);
                    s.text = report.text;
                }
            });
        });

        tokio::spawn(async move {
            let next = match engine.load(&model_id, on_progress).await {
                Ok(()) => {
                    info!("[EngineHandle] Model {} ready", model_id);
                    EngineStatus {
                        phase: EnginePhase::Ready,
                        progress: 100.0,
                        text: "AI ready".to_string(),
                    }
                }
                Err(e) => {
                    error!("[EngineHandle] Failed to load model {}: {}", model_id, e);
                    EngineStatus {
                        phase: EnginePhase::Failed,
                        progress: 0.0,
                        text: format!("Error initializing AI: {}. Try refreshing.", e),
                    }
                }
            };
            status.send_replace(next);
        });
    }

    async fn wait_until_settled(&self) -> Result<(), InferenceError> {
        let mut rx = self.status.subscribe();
        let settled = rx
            .wait_for(EngineStatus::is_settled)
            .await
            .map_err(|e| InferenceError::Unknown(e.to_string()))?
            .clone();

        match settled.phase {
            EnginePhase::Ready => Ok(()),
            _ => Err(InferenceError::LoadFailed(settled.text)),
        }
    }

    /// 流式对话补全，引擎未就绪时拒绝
    pub async fn chat_stream(&self, messages: Vec<ChatMessage>) -> Result<DeltaStream, InferenceError> {
        if !self.is_ready() {
            return Err(InferenceError::NotReady);
        }
        self.engine
            .chat_stream(CompletionRequest::new(messages, self.model_id.clone()))
            .await
    }
}
