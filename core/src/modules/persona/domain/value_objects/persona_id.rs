use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 角色唯一标识符（UUID v7，按创建时间有序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonaId(Uuid);

impl PersonaId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// 从字符串解析
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PersonaId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PersonaId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_id_roundtrip_through_string() {
        let id = PersonaId::new();
        let parsed = PersonaId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_persona_id_rejects_garbage() {
        assert!(PersonaId::parse("not-an-id").is_err());
    }
}
