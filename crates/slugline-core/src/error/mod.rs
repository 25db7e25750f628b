use thiserror::Error;

/// Core error type with minimal dependencies
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid identifier for {kind}: {value}")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid slug pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors reported by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store's unique index rejected a write: another document in the same
    /// scope already owns one of the slug values.
    #[error("Slug already taken in scope {scope_key}: {slug}")]
    UniquenessViolation { scope_key: String, slug: String },

    #[error("Document already exists: {collection}/{id}")]
    DuplicateDocument { collection: String, id: String },

    #[error("Document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },

    #[error(transparent)]
    CoreError(#[from] CoreError),

    #[error("Store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps an arbitrary backend error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
