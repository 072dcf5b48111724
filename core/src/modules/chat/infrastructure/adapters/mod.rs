// Chat Adapters

pub mod inference;
