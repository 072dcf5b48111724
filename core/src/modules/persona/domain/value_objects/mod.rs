// Persona Domain - Value Objects

mod form_data;
mod persona_id;

pub use form_data::*;
pub use persona_id::*;
