// Persona Domain Layer
// 角色实体、表单值对象、问卷定义和提示词编译

pub mod entities;
pub mod questionnaire;
pub mod services;
pub mod value_objects;

pub use entities::Persona;
pub use questionnaire::{ChoiceOption, Question, QuestionKind, Questionnaire, CUSTOM_RELATIONSHIP};
pub use services::{compile_system_prompt, PromptCompiler, NOT_SPECIFIED};
pub use value_objects::{PersonaForm, PersonaId, NAME_FIELD};
