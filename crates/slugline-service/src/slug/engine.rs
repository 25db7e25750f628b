//! Slug lifecycle.
//!
//! ## Summary
//! [`SlugEngine`] runs slug generation around every write of a document:
//! on create, on update when a tracked field or the scope changed, on
//! soft delete (history cleared) and on restore (slug regenerated).

use std::sync::Arc;

use chrono::Utc;

use slugline_core::error::CoreError;
use slugline_core::model::Document;
use slugline_core::store::DocumentStore;

use crate::error::{ServiceError, ServiceResult};

use super::lookup::{LookupArg, LookupOptions, find_documents};
use super::registry::{RegisteredType, TypeRegistry};
use super::scope::{self, ResolvedScope};
use super::token::build_token;
use super::uniqueness::resolve_unique;

/// Generates slugs and persists documents through a [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct SlugEngine<S> {
    store: S,
    registry: Arc<TypeRegistry>,
}

impl<S: DocumentStore> SlugEngine<S> {
    #[must_use]
    pub const fn new(store: S, registry: Arc<TypeRegistry>) -> Self {
        Self { store, registry }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn type_of(&self, document: &Document) -> ServiceResult<&RegisteredType> {
        let ty = self.registry.get(&document.doc_type)?;
        if ty.collection != document.collection {
            return Err(ServiceError::InvalidConfiguration(format!(
                "document of type {} is stored in {}, expected {}",
                document.doc_type, document.collection, ty.collection
            )));
        }
        Ok(ty)
    }

    /// ## Summary
    /// Resolves the current uniqueness scope of `document`.
    ///
    /// Returns `None` for types without slugs.
    ///
    /// ## Errors
    /// Returns an error if the document's type is not registered.
    pub fn scope_of(&self, document: &Document) -> ServiceResult<Option<ResolvedScope>> {
        let ty = self.type_of(document)?;
        Ok(ty
            .slug_config()
            .map(|config| scope::resolve(config.scope(), document)))
    }

    /// ## Summary
    /// Computes and records a slug for `document` without persisting it.
    ///
    /// Generation starts from the persisted slug state, so repeating it after
    /// a failed write does not stack unsaved values. When the document moved
    /// to a different scope, its history restarts. A requested slug stays on
    /// the document until a write succeeds. Returns the assigned slug, or
    /// `None` when the type has no slug or the candidate normalized to
    /// nothing (the history is left untouched).
    ///
    /// Reclaiming a slug from stale history writes the affected siblings.
    ///
    /// ## Errors
    /// Returns an error if the type is unknown or a store call fails.
    #[tracing::instrument(skip(self, document), fields(id = %document.id, doc_type = %document.doc_type))]
    pub async fn generate_slug(&self, document: &mut Document) -> ServiceResult<Option<String>> {
        let ty = self.type_of(document)?;
        let Some(config) = ty.slug_config() else {
            return Ok(None);
        };

        document.discard_unsaved_slug();
        let scope = scope::resolve(config.scope(), document);
        if document
            .scope_key
            .as_ref()
            .is_some_and(|previous| previous != &scope.key)
        {
            tracing::debug!(
                from = ?document.scope_key,
                to = %scope.key,
                "Scope changed; restarting slug history"
            );
            document.slug_history.clear();
        }

        let token = build_token(config, document);
        if token.is_empty() {
            tracing::debug!("Empty slug candidate; no slug assigned");
            document.scope_key = Some(scope.key);
            return Ok(None);
        }

        let slug = resolve_unique(&self.store, config, ty.id_kind, document, &scope, &token).await?;
        document.slug_history.record(&slug, config.keeps_history());
        document.scope_key = Some(scope.key);
        Ok(Some(slug))
    }

    /// ## Summary
    /// Generates the slug of a new document and inserts it.
    ///
    /// On failure the document's slug state is rolled back, so retrying
    /// `create` on the same document is safe.
    ///
    /// ## Errors
    /// - `CoreError` if the document was already persisted
    /// - `UniquenessViolation` if a concurrent writer took the slug
    /// - Any store error
    #[tracing::instrument(skip(self, document), fields(id = %document.id, doc_type = %document.doc_type))]
    pub async fn create(&self, document: &mut Document) -> ServiceResult<()> {
        if !document.is_new_record() {
            return Err(CoreError::InvariantViolation("create called on a persisted document").into());
        }
        let written = match self.generate_slug(document).await {
            Ok(_) => self.store.insert(document).await.map_err(ServiceError::from),
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            rollback(document, &err);
            return Err(err);
        }
        document.mark_persisted();
        tracing::debug!(slug = ?document.current_slug(), "Document created");
        Ok(())
    }

    /// ## Summary
    /// Regenerates the slug when needed and updates the document.
    ///
    /// A slug is regenerated unless the type's slug is permanent or the
    /// document is soft-deleted, and only when a tracked field changed, the
    /// scope changed, no slug is assigned yet, or a slug was requested. A
    /// failed write rolls the slug state back like [`Self::create`].
    ///
    /// ## Errors
    /// - `UniquenessViolation` if a concurrent writer took the slug
    /// - Any store error
    #[tracing::instrument(skip(self, document), fields(id = %document.id, doc_type = %document.doc_type))]
    pub async fn update(&self, document: &mut Document) -> ServiceResult<()> {
        if let Err(err) = self.regenerate_and_update(document).await {
            rollback(document, &err);
            return Err(err);
        }
        document.mark_persisted();
        Ok(())
    }

    async fn regenerate_and_update(&self, document: &mut Document) -> ServiceResult<()> {
        let ty = self.type_of(document)?;
        if let Some(config) = ty.slug_config() {
            let scope = scope::resolve(config.scope(), document);
            let scope_changed = document.scope_key.as_deref() != Some(scope.key.as_str());
            let regenerate = !config.is_permanent()
                && !document.is_deleted()
                && (config.tracked_fields_changed(document)
                    || scope_changed
                    || document.slug_history.is_empty()
                    || document.requested_slug.is_some());
            if regenerate {
                self.generate_slug(document).await?;
            } else {
                document.scope_key = Some(scope.key);
            }
        }
        self.store.update(document).await?;
        Ok(())
    }

    /// ## Summary
    /// Creates new documents, updates persisted ones.
    ///
    /// ## Errors
    /// See [`Self::create`] and [`Self::update`].
    pub async fn save(&self, document: &mut Document) -> ServiceResult<()> {
        if document.is_new_record() {
            self.create(document).await
        } else {
            self.update(document).await
        }
    }

    /// ## Summary
    /// Marks the document deleted and clears its slug history, which frees
    /// its slugs for other documents immediately.
    ///
    /// ## Errors
    /// Returns an error if the store update fails.
    #[tracing::instrument(skip(self, document), fields(id = %document.id, doc_type = %document.doc_type))]
    pub async fn soft_delete(&self, document: &mut Document) -> ServiceResult<()> {
        let deleted_at = document.deleted_at;
        document.slug_history.clear();
        document.deleted_at = Some(Utc::now());
        if let Err(err) = self.store.update(document).await {
            let err = ServiceError::from(err);
            document.deleted_at = deleted_at;
            rollback(document, &err);
            return Err(err);
        }
        document.mark_persisted();
        tracing::debug!("Document soft-deleted");
        Ok(())
    }

    /// ## Summary
    /// Clears the deletion mark and, unless the slug is permanent, generates
    /// a fresh slug. The slug may differ from the one held before deletion.
    ///
    /// ## Errors
    /// Returns an error if slug generation or the store update fails.
    #[tracing::instrument(skip(self, document), fields(id = %document.id, doc_type = %document.doc_type))]
    pub async fn restore(&self, document: &mut Document) -> ServiceResult<()> {
        let ty = self.type_of(document)?;
        let regenerate = ty.slug_config().is_some_and(|config| !config.is_permanent());
        let deleted_at = document.deleted_at.take();
        let written = if regenerate {
            match self.generate_slug(document).await {
                Ok(_) => self.store.update(document).await.map_err(ServiceError::from),
                Err(err) => Err(err),
            }
        } else {
            self.store.update(document).await.map_err(ServiceError::from)
        };
        if let Err(err) = written {
            document.deleted_at = deleted_at;
            rollback(document, &err);
            return Err(err);
        }
        document.mark_persisted();
        tracing::debug!(slug = ?document.current_slug(), "Document restored");
        Ok(())
    }

    /// ## Summary
    /// Finds documents of `type_name` by identifier or slug.
    ///
    /// ## Errors
    /// - `AmbiguousLookup` if the arguments mix kinds without an override
    /// - `NotFound` listing the arguments that matched nothing
    pub async fn find(
        &self,
        type_name: &str,
        args: &[LookupArg],
        options: &LookupOptions,
    ) -> ServiceResult<Vec<Document>> {
        find_documents(&self.store, &self.registry, type_name, args, options).await
    }

    /// ## Summary
    /// Finds a single document of `type_name` by identifier or slug.
    ///
    /// ## Errors
    /// See [`Self::find`].
    pub async fn find_one(
        &self,
        type_name: &str,
        arg: impl Into<LookupArg>,
        options: &LookupOptions,
    ) -> ServiceResult<Document> {
        let arg = arg.into();
        let missing = arg.to_string();
        self.find(type_name, &[arg], options)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound {
                type_name: type_name.to_string(),
                missing: vec![missing],
            })
    }
}

/// Returns `document` to its last persisted slug state after a failed write.
fn rollback(document: &mut Document, err: &ServiceError) {
    tracing::debug!(
        error = %err,
        retryable = err.is_retryable(),
        "Write failed; slug state rolled back"
    );
    document.discard_unsaved_slug();
}
