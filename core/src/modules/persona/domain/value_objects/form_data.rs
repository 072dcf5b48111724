use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 名称字段的问题 ID
pub const NAME_FIELD: &str = "name";

/// 问卷表单数据
///
/// 两个映射都以问题 ID 为键：选择题保存选项值，开放题保存自由文本。
/// 空白答案视为未作答。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaForm {
    #[serde(default)]
    pub multiple_choice: BTreeMap<String, String>,
    #[serde(default)]
    pub open_ended: BTreeMap<String, String>,
}

impl PersonaForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置选择题答案
    pub fn with_choice(mut self, question_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.multiple_choice.insert(question_id.into(), value.into());
        self
    }

    /// 设置开放题答案
    pub fn with_answer(mut self, question_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.open_ended.insert(question_id.into(), text.into());
        self
    }

    /// 选择题答案，空白视为未作答
    pub fn choice(&self, question_id: &str) -> Option<&str> {
        non_blank(self.multiple_choice.get(question_id))
    }

    /// 开放题答案，空白视为未作答
    pub fn answer(&self, question_id: &str) -> Option<&str> {
        non_blank(self.open_ended.get(question_id))
    }

    /// 去除首尾空白后的名称
    pub fn trimmed_name(&self) -> String {
        self.answer(NAME_FIELD)
            .map(|n| n.trim().to_string())
            .unwrap_or_default()
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_answers_are_absent() {
        let form = PersonaForm::new()
            .with_choice("tone", "")
            .with_answer("story", "   ")
            .with_answer("quirks", "hums");

        assert_eq!(form.choice("tone"), None);
        assert_eq!(form.answer("story"), None);
        assert_eq!(form.answer("quirks"), Some("hums"));
    }

    #[test]
    fn test_trimmed_name() {
        let form = PersonaForm::new().with_answer(NAME_FIELD, "  Alex ");
        assert_eq!(form.trimmed_name(), "Alex");
        assert_eq!(PersonaForm::new().trimmed_name(), "");
    }

    #[test]
    fn test_deserialize_camel_case_with_missing_maps() {
        let form: PersonaForm =
            serde_json::from_str(r#"{"openEnded":{"name":"Jamie"}}"#).unwrap();
        assert!(form.multiple_choice.is_empty());
        assert_eq!(form.answer("name"), Some("Jamie"));
    }
}
