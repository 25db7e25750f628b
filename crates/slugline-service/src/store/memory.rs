//! In-process [`DocumentStore`].
//!
//! ## Summary
//! Keeps documents in insertion order behind a `tokio` read/write lock along
//! with a unique index of `(scope_key, slug)` pairs. Every write checks and
//! updates the index under one write lock, so a racing writer sees either
//! the whole write or none of it.

use std::collections::HashMap;

use tokio::sync::RwLock;

use slugline_core::error::{StoreError, StoreResult};
use slugline_core::model::Document;
use slugline_core::store::{ConflictQuery, DocumentStore, SiblingSet, SlugHolder, SlugRelease};
use slugline_core::types::DocumentId;

type IndexKey = (String, String);
type DocumentKey = (String, DocumentId);

#[derive(Debug, Default)]
struct MemoryState {
    documents: Vec<Document>,
    index: HashMap<IndexKey, DocumentKey>,
}

impl MemoryState {
    fn position(&self, collection: &str, id: &DocumentId) -> Option<usize> {
        self.documents
            .iter()
            .position(|d| d.collection == collection && &d.id == id)
    }

    /// Fails if any history value of `document` is indexed for another document.
    fn check_unique(&self, document: &Document) -> StoreResult<()> {
        let scope_key = index_scope(document);
        for slug in document.slug_history.iter() {
            let key = (scope_key.to_string(), slug.to_string());
            if let Some((collection, id)) = self.index.get(&key)
                && (collection != &document.collection || id != &document.id)
            {
                return Err(StoreError::UniquenessViolation {
                    scope_key: scope_key.to_string(),
                    slug: slug.to_string(),
                });
            }
        }
        Ok(())
    }

    fn index(&mut self, document: &Document) {
        let scope_key = index_scope(document);
        for slug in document.slug_history.iter() {
            self.index.insert(
                (scope_key.to_string(), slug.to_string()),
                (document.collection.clone(), document.id.clone()),
            );
        }
    }

    fn unindex(&mut self, document: &Document) {
        let scope_key = index_scope(document);
        for slug in document.slug_history.iter() {
            self.index.remove(&(scope_key.to_string(), slug.to_string()));
        }
    }
}

fn index_scope(document: &Document) -> &str {
    document
        .scope_key
        .as_deref()
        .unwrap_or(document.collection.as_str())
}

fn stored(document: &Document) -> Document {
    let mut copy = document.clone();
    copy.mark_persisted();
    copy
}

fn visible(document: &Document, siblings: &SiblingSet, with_deleted: bool) -> bool {
    siblings.contains(document) && (with_deleted || !document.is_deleted())
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored copy of a document, deleted or not.
    pub async fn get(&self, collection: &str, id: &DocumentId) -> Option<Document> {
        let state = self.state.read().await;
        state
            .position(collection, id)
            .map(|i| state.documents[i].clone())
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.documents.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    async fn find_slug_conflicts(&self, query: &ConflictQuery<'_>) -> StoreResult<Vec<SlugHolder>> {
        let state = self.state.read().await;
        Ok(state
            .documents
            .iter()
            .filter(|d| &d.id != query.exclude && query.siblings.contains(d))
            .filter(|d| query.filter.is_none_or(|f| f.matches(d)))
            .filter(|d| d.slug_history.iter().any(|s| query.pattern.is_match(s)))
            .map(|d| SlugHolder {
                id: d.id.clone(),
                slug_history: d.slug_history.as_slice().to_vec(),
            })
            .collect())
    }

    async fn release_slugs(&self, collection: &str, releases: &[SlugRelease]) -> StoreResult<()> {
        let mut state = self.state.write().await;

        let mut positions = Vec::with_capacity(releases.len());
        for release in releases {
            let position = state.position(collection, &release.id).ok_or_else(|| {
                StoreError::DocumentNotFound {
                    collection: collection.to_string(),
                    id: release.id.to_string(),
                }
            })?;
            positions.push(position);
        }

        for (release, position) in releases.iter().zip(positions) {
            let mut document = state.documents[position].clone();
            state.unindex(&document);
            document.slug_history.remove_all(&release.slugs);
            state.index(&document);
            state.documents[position] = stored(&document);
            tracing::debug!(id = %release.id, slugs = ?release.slugs, "Released slugs");
        }
        Ok(())
    }

    async fn insert(&self, document: &Document) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.position(&document.collection, &document.id).is_some() {
            return Err(StoreError::DuplicateDocument {
                collection: document.collection.clone(),
                id: document.id.to_string(),
            });
        }
        state.check_unique(document)?;
        state.index(document);
        state.documents.push(stored(document));
        Ok(())
    }

    async fn update(&self, document: &Document) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let position = state
            .position(&document.collection, &document.id)
            .ok_or_else(|| StoreError::DocumentNotFound {
                collection: document.collection.clone(),
                id: document.id.to_string(),
            })?;
        state.check_unique(document)?;

        let previous = state.documents[position].clone();
        state.unindex(&previous);
        state.index(document);
        state.documents[position] = stored(document);
        Ok(())
    }

    async fn find_by_ids(
        &self,
        siblings: &SiblingSet,
        ids: &[DocumentId],
        with_deleted: bool,
    ) -> StoreResult<Vec<Document>> {
        let state = self.state.read().await;
        Ok(state
            .documents
            .iter()
            .filter(|d| visible(d, siblings, with_deleted) && ids.contains(&d.id))
            .cloned()
            .collect())
    }

    async fn find_by_slugs(
        &self,
        siblings: &SiblingSet,
        slugs: &[String],
        with_deleted: bool,
    ) -> StoreResult<Vec<Document>> {
        let state = self.state.read().await;
        Ok(state
            .documents
            .iter()
            .filter(|d| visible(d, siblings, with_deleted))
            .filter(|d| slugs.iter().any(|s| d.slug_history.contains(s)))
            .cloned()
            .collect())
    }
}
