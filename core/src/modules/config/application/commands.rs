// Config Commands
//
// 配置相关的命令处理器

use async_trait::async_trait;
use std::sync::Arc;

use crate::modules::config::domain::AppConfig;
use crate::modules::config::ports::{ConfigError, ConfigRepository};

/// 命令处理器 trait
#[async_trait]
pub trait CommandHandler<C> {
    type Output;
    type Error;

    async fn handle(&self, command: C) -> Result<Self::Output, Self::Error>;
}

// ============================================================================
// Save Config Command
// ============================================================================

/// 保存配置命令
#[derive(Debug, Clone)]
pub struct SaveConfigCommand {
    pub config: AppConfig,
}

impl SaveConfigCommand {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

/// 保存配置命令处理器
pub struct SaveConfigHandler {
    repository: Arc<dyn ConfigRepository>,
}

impl SaveConfigHandler {
    pub fn new(repository: Arc<dyn ConfigRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CommandHandler<SaveConfigCommand> for SaveConfigHandler {
    type Output = AppConfig;
    type Error = ConfigError;

    async fn handle(&self, command: SaveConfigCommand) -> Result<Self::Output, Self::Error> {
        command
            .config
            .validate()
            .map_err(|errors| ConfigError::ValidationError { errors })?;

        self.repository.save(&command.config).await?;

        Ok(command.config)
    }
}

// ============================================================================
// Reset Config Command
// ============================================================================

/// 重置配置命令
#[derive(Debug, Clone)]
pub struct ResetConfigCommand;

/// 重置配置命令处理器
pub struct ResetConfigHandler {
    repository: Arc<dyn ConfigRepository>,
}

impl ResetConfigHandler {
    pub fn new(repository: Arc<dyn ConfigRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CommandHandler<ResetConfigCommand> for ResetConfigHandler {
    type Output = AppConfig;
    type Error = ConfigError;

    async fn handle(&self, _command: ResetConfigCommand) -> Result<Self::Output, Self::Error> {
        // 清除现有配置后回到默认值
        self.repository.clear().await?;
        self.repository.load().await
    }
}
