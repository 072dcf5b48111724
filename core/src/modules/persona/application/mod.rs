// Persona Application Layer - 应用层
// 实现 CQRS 模式的命令和查询处理器

pub mod commands;
pub mod queries;

pub use commands::*;
pub use queries::*;

use async_trait::async_trait;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use super::domain::PersonaId;
use super::ports::RepositoryError;
use crate::shared::ErrorCode;

/// 角色存储错误
///
/// 存储层操作返回带标签的结果，调用方按 `code()` 分支处理
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation failed: {}", errors.join("; "))]
    Validation { errors: Vec<String> },

    #[error("A persona named '{0}' already exists")]
    DuplicateName(String),

    #[error("Persona not found: {0}")]
    NotFound(PersonaId),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl StoreError {
    /// 错误标签
    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::Validation { .. } => ErrorCode::ValidationError,
            StoreError::DuplicateName(_) => ErrorCode::DuplicateName,
            StoreError::NotFound(_) => ErrorCode::NotFound,
            StoreError::Storage(_) => ErrorCode::StorageError,
        }
    }
}

impl From<RepositoryError> for StoreError {
    fn from(err: RepositoryError) -> Self {
        StoreError::Storage(err.to_string())
    }
}

impl Serialize for StoreError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("StoreError", 2)?;
        state.serialize_field("error", &self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// 命令处理器 trait
#[async_trait]
pub trait CommandHandler<C, R>: Send + Sync
where
    C: Send + Sync,
{
    async fn handle(&self, command: C) -> Result<R, StoreError>;
}

/// 查询处理器 trait
#[async_trait]
pub trait QueryHandler<Q, R>: Send + Sync
where
    Q: Send + Sync,
{
    async fn handle(&self, query: Q) -> Result<R, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_codes() {
        let err = StoreError::Validation {
            errors: vec!["'Persona's Name' is required".to_string()],
        };
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(
            StoreError::DuplicateName("Alex".into()).code(),
            ErrorCode::DuplicateName
        );
    }

    #[test]
    fn test_store_error_serializes_as_tagged_object() {
        let err = StoreError::DuplicateName("Alex".into());
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["error"], "DUPLICATE_NAME");
        assert_eq!(json["message"], "A persona named 'Alex' already exists");
    }

    #[test]
    fn test_repository_error_becomes_storage_error() {
        let err: StoreError = RepositoryError::Storage("disk full".into()).into();
        assert_eq!(err.code(), ErrorCode::StorageError);
    }
}
