// Persona Domain - Services

mod prompt_compiler;

pub use prompt_compiler::*;
