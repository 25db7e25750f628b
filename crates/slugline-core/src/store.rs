//! Persistence contract consumed by the slug engine.
//!
//! ## Summary
//! The engine never talks to a database directly. It describes the shape of
//! each query (a [`SiblingSet`], an optional [`FieldFilter`], a
//! [`SlugPattern`]) and a [`DocumentStore`] executes it.
//!
//! Stores must enforce uniqueness of `(scope_key, slug)` over every value of
//! every document's history at write time and report a violation as
//! [`StoreError::UniquenessViolation`](crate::error::StoreError).

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::error::StoreResult;
use crate::model::Document;
use crate::types::DocumentId;
use crate::util::slug::SlugPattern;

/// The documents a slug must be unique against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiblingSet {
    /// Every document stored under the root type's collection.
    Root { collection: String },
    /// Documents whose `foreign_key` field refers to the same parent.
    Association {
        collection: String,
        foreign_key: String,
        /// Text form of the parent reference.
        parent_key: String,
        /// Name of the parent's relation holding these documents.
        inverse_of: String,
    },
    /// Documents embedded in the same parent under the same relation.
    Embedded {
        collection: String,
        parent_id: DocumentId,
        relation: String,
    },
}

impl SiblingSet {
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::Root { collection }
            | Self::Association { collection, .. }
            | Self::Embedded { collection, .. } => collection,
        }
    }

    /// Returns `true` if `document` belongs to this set.
    #[must_use]
    pub fn contains(&self, document: &Document) -> bool {
        if document.collection != self.collection() {
            return false;
        }
        match self {
            Self::Root { .. } => true,
            Self::Association {
                foreign_key,
                parent_key,
                ..
            } => document.field_text(foreign_key).as_deref() == Some(parent_key.as_str()),
            Self::Embedded {
                parent_id,
                relation,
                ..
            } => document
                .embedded_in
                .as_ref()
                .is_some_and(|e| &e.parent_id == parent_id && &e.relation == relation),
        }
    }
}

/// Equality filter on a raw field value. A missing field equals JSON null.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        document.field(&self.field).unwrap_or(&Value::Null) == &self.value
    }

    /// Compact JSON form of the filtered value, used in scope keys.
    ///
    /// Keeps JSON types apart so two documents share a key exactly when
    /// [`Self::matches`] puts them in the same scope: `null` and `""` differ,
    /// as do `1` and `"1"`.
    #[must_use]
    pub fn key_text(&self) -> String {
        self.value.to_string()
    }
}

/// Query for documents holding a token or any numbered variant of it.
#[derive(Debug, Clone, Copy)]
pub struct ConflictQuery<'a> {
    pub siblings: &'a SiblingSet,
    pub filter: Option<&'a FieldFilter>,
    pub pattern: &'a SlugPattern,
    /// The document whose slug is being computed.
    pub exclude: &'a DocumentId,
}

/// A sibling whose history contains at least one value matching a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugHolder {
    pub id: DocumentId,
    pub slug_history: Vec<String>,
}

/// Values to strip from one sibling's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugRelease {
    pub id: DocumentId,
    pub slugs: Vec<String>,
}

/// Storage operations the slug engine needs.
pub trait DocumentStore: Send + Sync {
    /// ## Summary
    /// Returns siblings other than `query.exclude` with a history value matching
    /// `query.pattern`, restricted by `query.filter` when present.
    ///
    /// Soft-deleted documents are included: until their history is cleared
    /// they still own their index entries.
    fn find_slug_conflicts(
        &self,
        query: &ConflictQuery<'_>,
    ) -> impl Future<Output = StoreResult<Vec<SlugHolder>>> + Send;

    /// ## Summary
    /// Removes the listed values from each sibling's history and index entries.
    /// Either every release is applied or none is.
    fn release_slugs(
        &self,
        collection: &str,
        releases: &[SlugRelease],
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Persists a new document and indexes its history under `document.scope_key`.
    fn insert(&self, document: &Document) -> impl Future<Output = StoreResult<()>> + Send;

    /// Persists an existing document and re-indexes its history under
    /// `document.scope_key`.
    fn update(&self, document: &Document) -> impl Future<Output = StoreResult<()>> + Send;

    fn find_by_ids(
        &self,
        siblings: &SiblingSet,
        ids: &[DocumentId],
        with_deleted: bool,
    ) -> impl Future<Output = StoreResult<Vec<Document>>> + Send;

    /// Returns documents in `siblings` whose history contains any of `slugs`.
    fn find_by_slugs(
        &self,
        siblings: &SiblingSet,
        slugs: &[String],
        with_deleted: bool,
    ) -> impl Future<Output = StoreResult<Vec<Document>>> + Send;
}

impl<S: DocumentStore> DocumentStore for Arc<S> {
    fn find_slug_conflicts(
        &self,
        query: &ConflictQuery<'_>,
    ) -> impl Future<Output = StoreResult<Vec<SlugHolder>>> + Send {
        (**self).find_slug_conflicts(query)
    }

    fn release_slugs(
        &self,
        collection: &str,
        releases: &[SlugRelease],
    ) -> impl Future<Output = StoreResult<()>> + Send {
        (**self).release_slugs(collection, releases)
    }

    fn insert(&self, document: &Document) -> impl Future<Output = StoreResult<()>> + Send {
        (**self).insert(document)
    }

    fn update(&self, document: &Document) -> impl Future<Output = StoreResult<()>> + Send {
        (**self).update(document)
    }

    fn find_by_ids(
        &self,
        siblings: &SiblingSet,
        ids: &[DocumentId],
        with_deleted: bool,
    ) -> impl Future<Output = StoreResult<Vec<Document>>> + Send {
        (**self).find_by_ids(siblings, ids, with_deleted)
    }

    fn find_by_slugs(
        &self,
        siblings: &SiblingSet,
        slugs: &[String],
        with_deleted: bool,
    ) -> impl Future<Output = StoreResult<Vec<Document>>> + Send {
        (**self).find_by_slugs(siblings, slugs, with_deleted)
    }
}
