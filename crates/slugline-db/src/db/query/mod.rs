pub mod document;
pub mod slug_index;
