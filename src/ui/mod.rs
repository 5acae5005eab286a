pub mod editor;
pub mod prompt;
