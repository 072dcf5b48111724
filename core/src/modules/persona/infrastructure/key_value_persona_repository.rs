use async_trait::async_trait;
use std::sync::Arc;

use crate::modules::persona::domain::Persona;
use crate::modules::persona::ports::{KeyValueStore, PersonaRepository, RepositoryError};

/// 默认的存储键
pub const DEFAULT_NAMESPACE: &str = "mirrormind-personas";

/// 基于键值存储的角色仓储
///
/// 整个角色集合序列化为一个 JSON 数组，存放在单个键下
pub struct KeyValuePersonaRepository {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl KeyValuePersonaRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[async_trait]
impl PersonaRepository for KeyValuePersonaRepository {
    async fn load_all(&self) -> Result<Vec<Persona>, RepositoryError> {
        match self.store.get(&self.namespace).await? {
            None => Ok(Vec::new()),
            Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| RepositoryError::Serialization(e.to_string())),
        }
    }

    async fn save_all(&self, personas: &[Persona]) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(personas)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        self.store.set(&self.namespace, raw).await
    }
}
