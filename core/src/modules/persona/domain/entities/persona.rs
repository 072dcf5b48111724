use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::super::value_objects::{PersonaForm, PersonaId, NAME_FIELD};
use crate::modules::chat::domain::{ChatSession, SessionId};

/// 角色实体
///
/// 聚合根：独占持有其全部聊天会话。
/// 顶层 `name` 与 `openEnded.name` 始终保持一致（均为去除空白后的值）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    id: PersonaId,
    name: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    multiple_choice: BTreeMap<String, String>,
    #[serde(default)]
    open_ended: BTreeMap<String, String>,
    #[serde(default)]
    chats: Vec<ChatSession>,
}

impl Persona {
    /// 从表单创建角色，会话列表为空
    ///
    /// 名称取 `openEnded.name` 去除首尾空白后的值，调用方负责先做校验
    pub fn new(form: PersonaForm) -> Self {
        let mut persona = Self {
            id: PersonaId::new(),
            name: String::new(),
            created_at: Utc::now(),
            multiple_choice: BTreeMap::new(),
            open_ended: BTreeMap::new(),
            chats: Vec::new(),
        };
        persona.apply_form(form);
        persona
    }

    // Getters
    pub fn id(&self) -> PersonaId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn multiple_choice(&self) -> &BTreeMap<String, String> {
        &self.multiple_choice
    }

    pub fn open_ended(&self) -> &BTreeMap<String, String> {
        &self.open_ended
    }

    /// 以表单形式返回当前属性
    pub fn form(&self) -> PersonaForm {
        PersonaForm {
            multiple_choice: self.multiple_choice.clone(),
            open_ended: self.open_ended.clone(),
        }
    }

    /// 按存储顺序返回会话
    pub fn chats(&self) -> &[ChatSession] {
        &self.chats
    }

    /// 按创建时间倒序返回会话（相同时间保持存储顺序）
    pub fn chats_newest_first(&self) -> Vec<ChatSession> {
        let mut chats = self.chats.clone();
        chats.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        chats
    }

    /// 名称是否与给定名称冲突（去除空白、忽略大小写）
    pub fn name_matches(&self, other: &str) -> bool {
        self.name.trim().to_lowercase() == other.trim().to_lowercase()
    }

    // 业务方法

    /// 用表单覆盖属性，保留 id、创建时间和会话
    pub fn apply_form(&mut self, form: PersonaForm) {
        let name = form.trimmed_name();
        self.multiple_choice = form.multiple_choice;
        self.open_ended = form.open_ended;
        self.open_ended.insert(NAME_FIELD.to_string(), name.clone());
        self.name = name;
    }

    pub fn chat(&self, chat_id: SessionId) -> Option<&ChatSession> {
        self.chats.iter().find(|c| c.id() == chat_id)
    }

    pub fn chat_mut(&mut self, chat_id: SessionId) -> Option<&mut ChatSession> {
        self.chats.iter_mut().find(|c| c.id() == chat_id)
    }

    /// 新会话总是插在最前面
    pub fn prepend_chat(&mut self, session: ChatSession) {
        self.chats.insert(0, session);
    }

    /// 删除会话，返回是否存在
    pub fn remove_chat(&mut self, chat_id: SessionId) -> bool {
        let before = self.chats.len();
        self.chats.retain(|c| c.id() != chat_id);
        self.chats.len() != before
    }
}
