pub mod citations;
pub mod document;
pub mod handbook;
pub mod intent;
pub mod sentences;
pub mod similarity;
