// 角色问卷
//
// 固定、有序的问题定义表。创建/编辑角色时用于校验表单，
// 编译提示词时用于查找关系选项的标签。

use serde::Serialize;

use super::value_objects::PersonaForm;

/// 关系问题中表示"自定义"的选项值
pub const CUSTOM_RELATIONSHIP: &str = "custom";

/// 问题类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKind {
    MultipleChoice,
    OpenEnded,
}

/// 选择题选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// 问题定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub question: &'static str,
    #[serde(skip_serializing_if = "no_options")]
    pub options: &'static [ChoiceOption],
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    pub description: &'static str,
}

impl Question {
    const fn open(
        id: &'static str,
        question: &'static str,
        description: &'static str,
        max_length: usize,
    ) -> Self {
        Self {
            id,
            kind: QuestionKind::OpenEnded,
            question,
            options: &[],
            required: false,
            max_length: Some(max_length),
            description,
        }
    }

    const fn choice(
        id: &'static str,
        question: &'static str,
        description: &'static str,
        options: &'static [ChoiceOption],
    ) -> Self {
        Self {
            id,
            kind: QuestionKind::MultipleChoice,
            question,
            options,
            required: false,
            max_length: None,
            description,
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// 按值查找选项
    pub fn option(&self, value: &str) -> Option<&'static ChoiceOption> {
        self.options.iter().find(|o| o.value == value)
    }
}

fn no_options(options: &&'static [ChoiceOption]) -> bool {
    options.is_empty()
}

const fn opt(value: &'static str, label: &'static str) -> ChoiceOption {
    ChoiceOption { value, label }
}

const TONE_OPTIONS: &[ChoiceOption] = &[
    opt("casual", "Casual: Friendly, informal"),
    opt("formal", "Formal: Polite and official"),
    opt("professional", "Professional: Businesslike and clear"),
    opt("friendly", "Friendly: Warm and welcoming"),
    opt("humorous", "Humorous: Lighthearted and funny"),
    opt("sarcastic", "Sarcastic: Witty or ironic"),
    opt("enthusiastic", "Enthusiastic: Energetic and excited"),
    opt("laid-back", "Laid-back: Relaxed and easygoing"),
];

const RELATIONSHIP_OPTIONS: &[ChoiceOption] = &[
    opt("friend", "Friend"),
    opt("sibling", "Sibling/Family: Brother/sister or other family member"),
    opt("colleague", "Colleague: Coworker or team member"),
    opt("mentor", "Mentor/Teacher: Someone who guides or teaches you"),
    opt("parent", "Parent/Guardian: Mother, father, or parental figure"),
    opt("partner", "Romantic Partner: Boyfriend, girlfriend, spouse, etc."),
    opt("service", "Customer Service/Helper: Professional assistant or advisor"),
    opt("stranger", "Stranger/Acquaintance: Someone you don't know well"),
    opt(CUSTOM_RELATIONSHIP, "Custom (Define Below)"),
];

const COMMUNICATION_STYLE_OPTIONS: &[ChoiceOption] = &[
    opt("concise", "Concise: To the point, brief"),
    opt("detailed", "Detailed/Verbose: Gives lots of information and explanation"),
    opt("enthusiastic", "Enthusiastic: Very energetic and positive"),
    opt("reserved", "Reserved: Quiet and thoughtful, uses few words"),
    opt("emotional", "Emotional: Expressive about feelings and moods"),
    opt("logical", "Logical: Rational and fact-focused"),
    opt("direct", "Direct: Straightforward and unambiguous"),
    opt("indirect", "Indirect: Subtle and suggestive"),
];

const FORMALITY_OPTIONS: &[ChoiceOption] = &[
    opt("veryFormal", "Very formal: Strictly adheres to etiquette"),
    opt("somewhatFormal", "Somewhat formal: Mostly polite, moderately formal"),
    opt("neutral", "Neutral: Neither too formal nor too casual"),
    opt("somewhatCasual", "Somewhat casual: Mostly informal but respectful"),
    opt("veryCasual", "Very casual: Very informal, slang or colloquial"),
];

const PRONOUN_OPTIONS: &[ChoiceOption] = &[
    opt("he/him", "He/Him"),
    opt("she/her", "She/Her"),
    opt("they/them", "They/Them"),
    opt("ze/hir", "Ze/Hir"),
    opt("ze/zir", "Ze/Zir"),
    opt("other", "Other/Prefer not to say"),
];

const AGE_GROUP_OPTIONS: &[ChoiceOption] = &[
    opt("child", "Child (Under 13)"),
    opt("teenager", "Teenager (13–19)"),
    opt("youngAdult", "Young Adult (20–35)"),
    opt("adult", "Adult (36–60)"),
    opt("senior", "Senior (61+)"),
    opt("ageless", "Ageless/Not Applicable"),
];

const HUMOR_STYLE_OPTIONS: &[ChoiceOption] = &[
    opt("none", "None/Straightforward"),
    opt("dry", "Dry: Subtle, deadpan humor"),
    opt("sarcastic", "Sarcastic: Irony or teasing"),
    opt("playful", "Playful/Goofy: Silly or playful jokes"),
    opt("dark", "Dark: Edgy or morbid humor"),
    opt("punny", "Punny/Wordplay: Loves puns and word jokes"),
    opt("observational", "Observational: Comments on everyday life"),
    opt("self-deprecating", "Self-deprecating: Makes fun of themselves"),
];

const PERSONALITY_VIBE_OPTIONS: &[ChoiceOption] = &[
    opt("cheerful", "Cheerful/Optimistic"),
    opt("serious", "Serious/Calm"),
    opt("shy", "Shy/Introverted"),
    opt("outgoing", "Outgoing/Extroverted"),
    opt("witty", "Witty/Clever"),
    opt("analytical", "Analytical/Thoughtful"),
    opt("independent", "Independent/Rebellious"),
    opt("caring", "Caring/Empathetic"),
    opt("creative", "Creative/Artistic"),
    opt("pragmatic", "Pragmatic/Realistic"),
];

static QUESTIONS: &[Question] = &[
    Question::open("name", "Persona's Name", "What is this person's name?", 50).required(),
    Question::choice(
        "tone",
        "Persona's Tone",
        "How does this persona generally sound?",
        TONE_OPTIONS,
    ),
    Question::choice(
        "relationship",
        "Relationship to You",
        "How do you relate to this persona?",
        RELATIONSHIP_OPTIONS,
    ),
    Question::open(
        "customRelationshipDetail",
        "Custom Relationship Details",
        "If you selected 'Custom' for relationship, please describe it here.",
        100,
    ),
    Question::choice(
        "communicationStyle",
        "Communication Style",
        "How do they typically communicate?",
        COMMUNICATION_STYLE_OPTIONS,
    ),
    Question::choice(
        "formalityLevel",
        "Formality Level",
        "How formal or informal is their language?",
        FORMALITY_OPTIONS,
    ),
    Question::choice(
        "pronouns",
        "Pronouns",
        "What are the persona's pronouns?",
        PRONOUN_OPTIONS,
    ),
    Question::choice(
        "ageGroup",
        "Age Group",
        "What is the approximate age group of the persona?",
        AGE_GROUP_OPTIONS,
    ),
    Question::choice(
        "humorStyle",
        "Humor Style",
        "What kind of humor, if any, do they use?",
        HUMOR_STYLE_OPTIONS,
    ),
    Question::choice(
        "personalityVibe",
        "General Personality Vibe",
        "What's their overall demeanor?",
        PERSONALITY_VIBE_OPTIONS,
    ),
    Question::open(
        "personalityDescription",
        "Describe the Persona's Personality",
        "A few adjectives or a short description.",
        200,
    ),
    Question::open(
        "catchphrases",
        "Catchphrases or Common Phrases",
        "Words or sayings they often use. (Separate with commas)",
        150,
    ),
    Question::open(
        "story",
        "Important Story or Memory",
        "A personal story or memory that defines them.",
        300,
    ),
    Question::open(
        "passions",
        "Passionate Topics",
        "Subjects they are deeply interested in. (Separate with commas)",
        200,
    ),
    Question::open(
        "humor",
        "Sense of Humor Details",
        "Elaborate on their humor style if needed.",
        150,
    ),
    Question::open(
        "favorites",
        "Favorite Things",
        "Hobbies, food, music, activities, etc. (Separate with commas)",
        200,
    ),
    Question::open(
        "quirks",
        "Quirks or Habits",
        "Unique mannerisms or habits. (Separate with commas)",
        200,
    ),
    Question::open(
        "other",
        "Anything Else Notable",
        "Other details or preferences that make them unique.",
        200,
    ),
];

/// 问卷
#[derive(Debug, Clone, Copy)]
pub struct Questionnaire {
    questions: &'static [Question],
}

impl Default for Questionnaire {
    fn default() -> Self {
        Self::standard()
    }
}

impl Questionnaire {
    /// 内置的标准问卷
    pub fn standard() -> Self {
        Self {
            questions: QUESTIONS,
        }
    }

    /// 全部问题（有序）
    pub fn questions(&self) -> &'static [Question] {
        self.questions
    }

    /// 按 ID 查找问题
    pub fn find(&self, id: &str) -> Option<&'static Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// 查找选项标签
    pub fn option_label(&self, question_id: &str, value: &str) -> Option<&'static str> {
        self.find(question_id)
            .and_then(|q| q.option(value))
            .map(|o| o.label)
    }

    /// 校验表单，收集所有错误信息
    pub fn validate(&self, form: &PersonaForm) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (id, value) in &form.multiple_choice {
            if value.trim().is_empty() {
                continue;
            }
            match self.find(id) {
                None => errors.push(format!("Unknown question: {}", id)),
                Some(q) if q.kind != QuestionKind::MultipleChoice => {
                    errors.push(format!("Question '{}' is not multiple choice", id))
                }
                Some(q) if q.option(value).is_none() => {
                    errors.push(format!("Invalid option '{}' for question '{}'", value, id))
                }
                Some(_) => {}
            }
        }

        for (id, value) in &form.open_ended {
            if value.trim().is_empty() {
                continue;
            }
            match self.find(id) {
                None => errors.push(format!("Unknown question: {}", id)),
                Some(q) if q.kind != QuestionKind::OpenEnded => {
                    errors.push(format!("Question '{}' is not open ended", id))
                }
                Some(q) => {
                    if let Some(max) = q.max_length {
                        let len = value.chars().count();
                        if len > max {
                            errors.push(format!(
                                "'{}' must be at most {} characters (got {})",
                                q.question, max, len
                            ));
                        }
                    }
                }
            }
        }

        for q in self.questions.iter().filter(|q| q.required) {
            let answered = match q.kind {
                QuestionKind::MultipleChoice => form.choice(q.id).is_some(),
                QuestionKind::OpenEnded => form.answer(q.id).is_some(),
            };
            if !answered {
                errors.push(format!("'{}' is required", q.question));
            }
        }

        if form.choice("relationship") == Some(CUSTOM_RELATIONSHIP)
            && form.answer("customRelationshipDetail").is_none()
        {
            errors.push("Please describe the custom relationship".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
