use async_trait::async_trait;
use thiserror::Error;

/// 仓储错误类型
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// 键值存储端口
///
/// 按单个字符串键读写整份文档，没有局部更新
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 读取键对应的值，不存在时返回 None
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError>;

    /// 覆盖写入
    async fn set(&self, key: &str, value: String) -> Result<(), RepositoryError>;
}
