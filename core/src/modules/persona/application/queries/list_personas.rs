use async_trait::async_trait;
use std::sync::Arc;

use super::super::{QueryHandler, StoreError};
use crate::modules::persona::domain::Persona;
use crate::modules::persona::ports::PersonaRepository;

/// 列出角色查询
#[derive(Debug, Clone, Default)]
pub struct ListPersonasQuery {
    /// 名称搜索词（忽略大小写的子串匹配），为空时返回全部
    pub search: Option<String>,
}

impl ListPersonasQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
        }
    }
}

/// 列出角色查询处理器（保持存储顺序）
pub struct ListPersonasHandler {
    repository: Arc<dyn PersonaRepository>,
}

impl ListPersonasHandler {
    pub fn new(repository: Arc<dyn PersonaRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<ListPersonasQuery, Vec<Persona>> for ListPersonasHandler {
    async fn handle(&self, query: ListPersonasQuery) -> Result<Vec<Persona>, StoreError> {
        let personas = self.repository.load_all().await?;

        let term = query
            .search
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());

        Ok(match term {
            Some(term) => personas
                .into_iter()
                .filter(|p| p.name().to_lowercase().contains(&term))
                .collect(),
            None => personas,
        })
    }
}
