use super::super::entities::Persona;
use super::super::questionnaire::{Questionnaire, CUSTOM_RELATIONSHIP};

/// 单值字段缺失时的占位文本
pub const NOT_SPECIFIED: &str = "not specified";

/// 年龄段缺失时的占位文本
const AGE_FALLBACK: &str = "various ages";

/// 提示词编译器
///
/// 领域服务：把角色属性编译为系统提示词。
/// 纯函数，不依赖随机数或外部状态，同一角色总是得到同一字符串。
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptCompiler {
    questionnaire: Questionnaire,
}

impl PromptCompiler {
    pub fn new(questionnaire: Questionnaire) -> Self {
        Self { questionnaire }
    }

    /// 编译系统提示词
    pub fn compile(&self, persona: &Persona) -> String {
        let name = persona.name();
        let pronouns = choice(persona, "pronouns").unwrap_or(NOT_SPECIFIED);
        let gender = grammatical_gender(pronouns);
        let relationship = self.relationship_label(
            choice(persona, "relationship"),
            answer(persona, "customRelationshipDetail"),
        );
        let age = choice(persona, "ageGroup").unwrap_or(AGE_FALLBACK);
        let tone = choice(persona, "tone").unwrap_or(NOT_SPECIFIED);
        let style = choice(persona, "communicationStyle").unwrap_or(NOT_SPECIFIED);
        let formality = choice(persona, "formalityLevel").unwrap_or(NOT_SPECIFIED);
        let personality = answer(persona, "personalityDescription")
            .or_else(|| choice(persona, "personalityVibe"))
            .unwrap_or(NOT_SPECIFIED);
        let humor = answer(persona, "humor")
            .or_else(|| choice(persona, "humorStyle"))
            .unwrap_or(NOT_SPECIFIED);

        let mut prompt = format!(
            "You are now roleplaying as {name}. You are a {age} {gender} who is the user's {relationship}. \
Your pronouns are {pronouns}. Your tone should be {tone} and your communication style is {style}. \
Use the appropriate level of formality: {formality}. Below is your persona profile:\n\
Personality: {personality}\n\
Catchphrases: {catchphrases}\n\
Background/Memory: {story}\n\
Passions/Interests: {passions}\n\
Favorite Things: {favorites}\n\
Humor Style: {humor}\n\
Quirks/Habits: {quirks}\n",
            catchphrases = answer(persona, "catchphrases").unwrap_or_default(),
            story = answer(persona, "story").unwrap_or_default(),
            passions = answer(persona, "passions").unwrap_or_default(),
            favorites = answer(persona, "favorites").unwrap_or_default(),
            quirks = answer(persona, "quirks").unwrap_or_default(),
        );

        if let Some(other) = answer(persona, "other") {
            prompt.push_str(&format!("Other Details: {}\n", other));
        }

        prompt.push_str(&format!(
            "Guidelines (you must follow these):\n\
Always speak and act as {name}, using first-person (\"I\") perspective.\n\
Use the specified tone and style consistently in every response.\n\
Incorporate the given catchphrases and personal details naturally.\n\
Refer to your background and favorite topics as if you truly know them.\n\
Never break character or mention being an AI/system or using a persona template.\n\
Keep all personal facts fixed; do not invent new details not provided.\n\
If asked about something outside this profile, say you don't recall or it's unknown.\n\
Focus on sounding authentic and true to {name}'s personality.\n\
Use this persona information to guide all your replies. Speak as {name} would, \
making each response feel like it's genuinely from this person."
        ));

        prompt
    }

    /// 关系标签：自定义关系用自由文本，否则取选项标签冒号前的部分
    fn relationship_label<'a>(&self, value: Option<&'a str>, custom: Option<&'a str>) -> &'a str {
        match value {
            None => NOT_SPECIFIED,
            Some(CUSTOM_RELATIONSHIP) => custom.unwrap_or(CUSTOM_RELATIONSHIP),
            Some(v) => match self.questionnaire.option_label("relationship", v) {
                Some(label) => label.split(':').next().unwrap_or(label),
                None => v,
            },
        }
    }
}

/// 选择题答案，空白视为缺失
fn choice<'a>(persona: &'a Persona, id: &str) -> Option<&'a str> {
    non_blank(persona.multiple_choice().get(id))
}

/// 开放题答案，空白视为缺失
fn answer<'a>(persona: &'a Persona, id: &str) -> Option<&'a str> {
    non_blank(persona.open_ended().get(id))
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

/// 代词映射到语法性别占位词
fn grammatical_gender(pronouns: &str) -> &'static str {
    match pronouns {
        "he/him" => "man",
        "she/her" => "woman",
        _ => "person",
    }
}

/// 使用标准问卷编译系统提示词
pub fn compile_system_prompt(persona: &Persona) -> String {
    PromptCompiler::default().compile(persona)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::persona::domain::PersonaForm;

    fn persona(form: PersonaForm) -> Persona {
        Persona::new(form.with_answer("name", "Alex"))
    }

    #[test]
    fn test_full_profile() {
        let p = persona(
            PersonaForm::new()
                .with_choice("pronouns", "she/her")
                .with_choice("relationship", "mentor")
                .with_choice("ageGroup", "adult")
                .with_choice("tone", "friendly")
                .with_choice("communicationStyle", "direct")
                .with_choice("formalityLevel", "neutral")
                .with_answer("personalityDescription", "Patient and curious")
                .with_answer("catchphrases", "Let's get to it.")
                .with_answer("humor", "Loves puns"),
        );

        let prompt = compile_system_prompt(&p);

        assert!(prompt.starts_with(
            "You are now roleplaying as Alex. You are a adult woman who is the user's Mentor/Teacher."
        ));
        assert!(prompt.contains("Your pronouns are she/her."));
        assert!(prompt.contains("Your tone should be friendly and your communication style is direct."));
        assert!(prompt.contains("formality: neutral."));
        assert!(prompt.contains("\nPersonality: Patient and curious\n"));
        assert!(prompt.contains("\nCatchphrases: Let's get to it.\n"));
        assert!(prompt.contains("\nHumor Style: Loves puns\n"));
        assert!(prompt.contains("Always speak and act as Alex"));
        assert!(!prompt.contains("Other Details"));
    }

    #[test]
    fn test_missing_fields_use_placeholders() {
        let prompt = compile_system_prompt(&persona(PersonaForm::new()));

        assert!(prompt.contains("You are a various ages person who is the user's not specified."));
        assert!(prompt.contains("Your pronouns are not specified."));
        assert!(prompt.contains("\nPersonality: not specified\n"));
        assert!(prompt.contains("\nHumor Style: not specified\n"));
        // 自由文本缺失时留空
        assert!(prompt.contains("\nBackground/Memory: \n"));
        assert!(prompt.contains("\nQuirks/Habits: \n"));
    }

    #[test]
    fn test_pronoun_mapping() {
        for (pronouns, gender) in [
            ("he/him", "man"),
            ("she/her", "woman"),
            ("they/them", "person"),
            ("ze/zir", "person"),
            ("other", "person"),
        ] {
            let p = persona(PersonaForm::new().with_choice("pronouns", pronouns));
            let expected = format!("various ages {} who", gender);
            assert!(compile_system_prompt(&p).contains(&expected), "{}", pronouns);
        }
    }

    #[test]
    fn test_relationship_resolution() {
        let custom = persona(
            PersonaForm::new()
                .with_choice("relationship", "custom")
                .with_answer("customRelationshipDetail", "childhood imaginary friend"),
        );
        assert!(compile_system_prompt(&custom).contains("user's childhood imaginary friend."));

        let custom_blank = persona(PersonaForm::new().with_choice("relationship", "custom"));
        assert!(compile_system_prompt(&custom_blank).contains("user's custom."));

        let friend = persona(PersonaForm::new().with_choice("relationship", "friend"));
        assert!(compile_system_prompt(&friend).contains("user's Friend."));

        let unknown = persona(PersonaForm::new().with_choice("relationship", "rival"));
        assert!(compile_system_prompt(&unknown).contains("user's rival."));
    }

    #[test]
    fn test_fallbacks_to_choice_values() {
        let p = persona(
            PersonaForm::new()
                .with_choice("personalityVibe", "witty")
                .with_choice("humorStyle", "dry"),
        );
        let prompt = compile_system_prompt(&p);

        assert!(prompt.contains("\nPersonality: witty\n"));
        assert!(prompt.contains("\nHumor Style: dry\n"));
    }

    #[test]
    fn test_other_details_included_when_present() {
        let p = persona(PersonaForm::new().with_answer("other", "Has a corgi named Sparky"));
        assert!(compile_system_prompt(&p).contains("\nOther Details: Has a corgi named Sparky\n"));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let p = persona(PersonaForm::new().with_choice("tone", "casual"));
        assert_eq!(compile_system_prompt(&p), compile_system_prompt(&p));
    }
}
