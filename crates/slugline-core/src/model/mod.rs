pub mod document;
pub mod history;

pub use document::{Document, Embedding, value_text};
pub use history::SlugHistory;
