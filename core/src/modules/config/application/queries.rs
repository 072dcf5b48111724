// Config Queries
//
// 配置相关的查询处理器

use async_trait::async_trait;
use std::sync::Arc;

use crate::modules::config::domain::AppConfig;
use crate::modules::config::ports::{ConfigError, ConfigRepository};

/// 查询处理器 trait
#[async_trait]
pub trait QueryHandler<Q> {
    type Output;
    type Error;

    async fn handle(&self, query: Q) -> Result<Self::Output, Self::Error>;
}

/// 获取全部配置查询
#[derive(Debug, Clone, Default)]
pub struct GetAllConfigQuery;

/// 获取全部配置查询处理器
pub struct GetAllConfigHandler {
    repository: Arc<dyn ConfigRepository>,
}

impl GetAllConfigHandler {
    pub fn new(repository: Arc<dyn ConfigRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<GetAllConfigQuery> for GetAllConfigHandler {
    type Output = AppConfig;
    type Error = ConfigError;

    async fn handle(&self, _query: GetAllConfigQuery) -> Result<Self::Output, Self::Error> {
        self.repository.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::config::infrastructure::InMemoryConfigRepository;

    #[tokio::test]
    async fn test_get_all_config() {
        let handler = GetAllConfigHandler::new(Arc::new(InMemoryConfigRepository::new()));
        let config = handler.handle(GetAllConfigQuery).await.unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
