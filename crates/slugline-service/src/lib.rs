//! Slug generation, uniqueness and lookup for schemaless documents.

pub mod error;
pub mod slug;
pub mod store;

pub use error::{ServiceError, ServiceResult};
