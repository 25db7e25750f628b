use thiserror::Error;

use slugline_core::error::{CoreError, StoreError};

/// Database layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    PoolError(#[from] diesel_async::pooled_connection::bb8::RunError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    CoreError(#[from] CoreError),

    /// The `document_slug` primary key rejected a history value.
    #[error("Slug already taken in scope {scope_key}: {slug}")]
    SlugTaken { scope_key: String, slug: String },

    #[error("Document already exists: {collection}/{id}")]
    DuplicateDocument { collection: String, id: String },

    #[error("Document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },

    #[error("Malformed document row {collection}/{id}: {reason}")]
    MalformedRow {
        collection: String,
        id: String,
        reason: &'static str,
    },
}

pub type DbResult<T> = std::result::Result<T, DbError>;

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::SlugTaken { scope_key, slug } => Self::UniquenessViolation { scope_key, slug },
            DbError::DuplicateDocument { collection, id } => {
                Self::DuplicateDocument { collection, id }
            }
            DbError::DocumentNotFound { collection, id } => {
                Self::DocumentNotFound { collection, id }
            }
            DbError::CoreError(core) => Self::CoreError(core),
            other => Self::backend(other),
        }
    }
}
