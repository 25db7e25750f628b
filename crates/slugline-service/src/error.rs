use thiserror::Error;

use slugline_core::error::{CoreError, StoreError};

/// Service layer errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    CoreError(#[from] CoreError),

    #[error(transparent)]
    StoreError(StoreError),

    /// A concurrent writer claimed the slug between the uniqueness check and
    /// the write. Recompute the slug and retry.
    #[error("Slug already taken in scope {scope_key}: {slug}")]
    UniquenessViolation { scope_key: String, slug: String },

    #[error("Not found: {type_name} {missing:?}")]
    NotFound {
        type_name: String,
        missing: Vec<String>,
    },

    #[error("Ambiguous lookup for {type_name}: arguments mix identifier and non-string kinds")]
    AmbiguousLookup { type_name: String },

    #[error("Unknown document type: {0}")]
    UnknownType(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ServiceError {
    /// Returns `true` if retrying the whole operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::UniquenessViolation { .. })
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniquenessViolation { scope_key, slug } => {
                Self::UniquenessViolation { scope_key, slug }
            }
            StoreError::CoreError(core) => Self::CoreError(core),
            other => Self::StoreError(other),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
