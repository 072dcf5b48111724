use async_trait::async_trait;

use super::RepositoryError;
use crate::modules::persona::domain::Persona;

/// 角色仓储端口
///
/// 整个角色集合作为一份文档读写：每次修改都是完整的读-改-写
#[async_trait]
pub trait PersonaRepository: Send + Sync {
    /// 读取全部角色（按存储顺序）
    async fn load_all(&self) -> Result<Vec<Persona>, RepositoryError>;

    /// 覆盖保存全部角色
    async fn save_all(&self, personas: &[Persona]) -> Result<(), RepositoryError>;
}
