// Config Domain Entities
//
// 配置领域实体定义

use serde::{Deserialize, Serialize};

/// 存储配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// 角色文档所在的键
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: "mirrormind-personas".to_string(),
        }
    }
}

/// 推理引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub model_id: String,
    /// OpenAI 兼容的本地推理服务地址
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_id: "llama3.2:3b".to_string(),
            base_url: "http://127.0.0.1:11434/v1".to_string(),
            timeout_secs: 120,
        }
    }
}

/// 对话配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationConfig {
    /// 上下文窗口中每种角色保留的消息数
    pub per_role_limit: usize,
    /// 问候流程使用的合成指令
    pub greeting_instruction: String,
    pub reply_fallback: String,
    pub edit_fallback: String,
    pub greeting_fallback: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            per_role_limit: 2,
            greeting_instruction:
                "Start the conversation with a greeting in 5-6 sentences introducing yourself."
                    .to_string(),
            reply_fallback: "Sorry, I encountered an error trying to respond.".to_string(),
            edit_fallback: "Sorry, I encountered an error trying to respond to your edit."
                .to_string(),
            greeting_fallback: "Hello! I'm ready to chat.".to_string(),
        }
    }
}

/// 应用配置聚合根
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub engine: EngineConfig,
    pub conversation: ConversationConfig,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 验证配置是否有效
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.storage.namespace.trim().is_empty() {
            errors.push("Storage namespace cannot be empty".to_string());
        }
        if self.engine.model_id.trim().is_empty() {
            errors.push("Engine model id cannot be empty".to_string());
        }
        if self.engine.base_url.trim().is_empty() {
            errors.push("Engine base URL cannot be empty".to_string());
        }
        if self.conversation.per_role_limit == 0 {
            errors.push("Per-role history limit must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.namespace, "mirrormind-personas");
        assert_eq!(config.conversation.per_role_limit, 2);
    }

    #[test]
    fn test_validate_collects_errors() {
        let mut config = AppConfig::default();
        config.storage.namespace = " ".to_string();
        config.engine.model_id.clear();
        config.conversation.per_role_limit = 0;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"engine":{"modelId":"phi-3"}}"#).unwrap();

        assert_eq!(config.engine.model_id, "phi-3");
        assert_eq!(config.engine.timeout_secs, 120);
        assert_eq!(config.conversation, ConversationConfig::default());
    }
}
