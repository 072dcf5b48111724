// 本地推理服务适配器
//
// 对接 OpenAI 兼容的本地推理服务（/models 与 /chat/completions），
// 流式响应按 SSE `data:` 行解析，遇到 `[DONE]` 结束。

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::modules::chat::domain::ChatMessage;
use crate::modules::chat::ports::{
    CompletionRequest, DeltaStream, InferenceEngine, InferenceError, InitProgress,
    ProgressCallback, StreamChunk,
};

/// 请求格式
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// 模型列表响应
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// 流式响应格式
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// 单行 SSE 的解析结果
#[derive(Debug, PartialEq)]
enum SseLine {
    Chunk(StreamChunk),
    Done,
}

/// 解析 SSE 行，非 data 行和无法解析的负载返回 None
fn parse_sse_line(line: &str) -> Option<SseLine> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data == "[DONE]" {
        return Some(SseLine::Done);
    }

    match serde_json::from_str::<StreamResponse>(data) {
        Ok(response) => {
            let content = response
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta.content);
            Some(SseLine::Chunk(StreamChunk { content }))
        }
        Err(e) => {
            debug!("[LocalServer] Skipping malformed SSE payload: {}", e);
            None
        }
    }
}

/// 把字节流解码为增量流
///
/// 按字节缓冲到换行再解码，多字节字符跨块也不会被截断
fn sse_deltas<S, B, E>(source: S) -> DeltaStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    struct State<S> {
        source: std::pin::Pin<Box<S>>,
        buffer: Vec<u8>,
        finished: bool,
    }

    let state = State {
        source: Box::pin(source),
        buffer: Vec::new(),
        finished: false,
    };

    let stream = stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }

            // 先处理缓冲区中所有完整的行
            while let Some(pos) = state.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = state.buffer.drain(..=pos).collect();
                match parse_sse_line(&String::from_utf8_lossy(&line)) {
                    Some(SseLine::Chunk(chunk)) => return Some((Ok(chunk), state)),
                    Some(SseLine::Done) => {
                        state.finished = true;
                        return None;
                    }
                    None => {}
                }
            }

            match state.source.next().await {
                Some(Ok(bytes)) => state.buffer.extend_from_slice(bytes.as_ref()),
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(InferenceError::Stream(e.to_string())), state));
                }
                None => {
                    // 末尾可能还有一行没有换行符
                    state.finished = true;
                    let rest = std::mem::take(&mut state.buffer);
                    if let Some(SseLine::Chunk(chunk)) =
                        parse_sse_line(&String::from_utf8_lossy(&rest))
                    {
                        return Some((Ok(chunk), state));
                    }
                    return None;
                }
            }
        }
    });

    Box::pin(stream)
}

/// 本地推理服务配置
#[derive(Debug, Clone)]
pub struct LocalServerConfig {
    pub base_url: String,
    /// 只限制建立连接，流式生成本身不设超时
    pub timeout_secs: u64,
}

/// 本地推理服务适配器
pub struct LocalServerEngine {
    config: LocalServerConfig,
    client: Client,
}

impl LocalServerEngine {
    pub fn new(config: LocalServerConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LocalServerConfig {
        &self.config
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    async fn api_error(response: reqwest::Response) -> InferenceError {
        let status = response.status();
        let message = response.text().await.unwrap_or_default();
        error!("[LocalServer] API error: {} - {}", status, message);
        InferenceError::Api {
            code: status.as_str().to_string(),
            message,
        }
    }
}

#[async_trait]
impl InferenceEngine for LocalServerEngine {
    fn engine_id(&self) -> &str {
        "local-server"
    }

    async fn load(&self, model: &str, on_progress: ProgressCallback) -> Result<(), InferenceError> {
        on_progress(InitProgress::new(
            0.0,
            format!("Connecting to {}", self.config.base_url),
        ));

        let response = self
            .client
            .get(self.api_url("models"))
            .send()
            .await
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let models: ModelsResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::Unknown(e.to_string()))?;

        if !models.data.iter().any(|m| m.id == model) {
            return Err(InferenceError::ModelNotFound(model.to_string()));
        }

        info!("[LocalServer] Model {} available", model);
        on_progress(InitProgress::new(1.0, format!("Model {} ready", model)));
        Ok(())
    }

    async fn chat_stream(&self, request: CompletionRequest) -> Result<DeltaStream, InferenceError> {
        debug!(
            "[LocalServer] Streaming request: model={}, messages={}",
            request.model,
            request.messages.len()
        );

        let body = ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            stream: true,
        };

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(sse_deltas(response.bytes_stream()))
    }
}
