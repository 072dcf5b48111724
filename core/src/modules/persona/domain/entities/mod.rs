// Persona Domain - Entities

mod persona;

pub use persona::*;
