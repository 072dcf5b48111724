// Config Module
//
// 配置管理模块，采用六边形架构
//
// 层次结构:
// - domain: 领域层，包含配置实体与校验规则
// - ports: 端口层，定义配置读写的抽象接口
// - infrastructure: 基础设施层，实现具体的配置存储适配器
// - application: 应用层，实现 CQRS 命令和查询处理器

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

// Domain
pub use domain::{AppConfig, ConversationConfig, EngineConfig, StorageConfig};

// Ports
pub use ports::{ConfigError, ConfigRepository};

// Infrastructure
pub use infrastructure::{InMemoryConfigRepository, StoreConfigRepository};

// Application
pub use application::{
    CommandHandler, GetAllConfigHandler, GetAllConfigQuery, QueryHandler, ResetConfigCommand,
    ResetConfigHandler, SaveConfigCommand, SaveConfigHandler,
};

use std::sync::Arc;

/// Config 模块容器
///
/// 管理模块内的依赖注入
pub struct ConfigModule {
    get_all_handler: GetAllConfigHandler,
    save_handler: SaveConfigHandler,
    reset_handler: ResetConfigHandler,
}

impl ConfigModule {
    /// 使用内存仓储创建（用于测试）
    pub fn new_in_memory() -> Self {
        Self::with_repository(Arc::new(InMemoryConfigRepository::new()))
    }

    /// 使用文件存储创建
    pub fn new_with_store(app_data_dir: std::path::PathBuf) -> Self {
        Self::with_repository(Arc::new(StoreConfigRepository::new(app_data_dir)))
    }

    /// 使用自定义仓储创建
    pub fn with_repository(repository: Arc<dyn ConfigRepository>) -> Self {
        Self {
            get_all_handler: GetAllConfigHandler::new(repository.clone()),
            save_handler: SaveConfigHandler::new(repository.clone()),
            reset_handler: ResetConfigHandler::new(repository),
        }
    }

    /// 获取全部配置
    pub async fn get_all(&self) -> Result<AppConfig, ConfigError> {
        self.get_all_handler.handle(GetAllConfigQuery).await
    }

    /// 校验并保存配置
    pub async fn save(&self, config: AppConfig) -> Result<AppConfig, ConfigError> {
        self.save_handler
            .handle(SaveConfigCommand::new(config))
            .await
            .inspect_err(|e| tracing::warn!("[Config] Failed to save config: {}", e))
    }

    /// 重置配置
    pub async fn reset(&self) -> Result<AppConfig, ConfigError> {
        let config = self.reset_handler.handle(ResetConfigCommand).await?;
        tracing::info!("[Config] Config reset to defaults");
        Ok(config)
    }
}
