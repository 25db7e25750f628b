//! `PostgreSQL` implementation of the persistence contract.
//!
//! ## Summary
//! Documents live in `document`; every value of every slug history has a row
//! in `document_slug` keyed by `(scope_key, slug)`. Writes rewrite a
//! document's index rows in the same transaction as the document itself, so
//! the primary key rejects a racing writer that chose the same slug.

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use slugline_core::error::StoreResult;
use slugline_core::model::{Document, SlugHistory};
use slugline_core::store::{ConflictQuery, DocumentStore, SiblingSet, SlugHolder, SlugRelease};
use slugline_core::types::DocumentId;

use crate::db::DbProvider;
use crate::db::enums::IdKindColumn;
use crate::db::query::document as query;
use crate::db::schema::{document, document_slug};
use crate::error::{DbError, DbResult};
use crate::model::document::{DocumentChanges, DocumentRow, NewSlugEntry};

#[derive(Debug, Clone)]
pub struct PgDocumentStore<P> {
    provider: P,
}

impl<P: DbProvider> PgDocumentStore<P> {
    #[must_use]
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    #[tracing::instrument(skip(self, conflict), fields(pattern = %conflict.pattern.as_str()))]
    async fn conflicts(&self, conflict: &ConflictQuery<'_>) -> DbResult<Vec<SlugHolder>> {
        let mut q = query::in_siblings(conflict.siblings)?;
        if let Some(filter) = conflict.filter {
            q = query::field_equals(q, filter);
        }
        q = query::history_matches(q, conflict.pattern);
        q = query::excluding(q, conflict.exclude);

        let mut conn = self.provider.get_connection().await?;
        let rows: Vec<(String, IdKindColumn, Vec<String>)> = q
            .select((document::id, document::id_kind, document::slug_history))
            .load(&mut conn)
            .await?;

        let holders = rows
            .into_iter()
            .map(|(id, kind, slug_history)| -> DbResult<SlugHolder> {
                Ok(SlugHolder {
                    id: DocumentId::parse(kind.into(), &id)?,
                    slug_history,
                })
            })
            .collect::<DbResult<Vec<_>>>()?;
        tracing::trace!(holders = holders.len(), "Loaded slug conflicts");
        Ok(holders)
    }

    #[tracing::instrument(skip(self, releases), fields(releases = releases.len()))]
    async fn release(&self, collection: &str, releases: &[SlugRelease]) -> DbResult<()> {
        let mut conn = self.provider.get_connection().await?;
        conn.transaction::<_, DbError, _>(|tx| {
            async move {
                for release in releases {
                    release_one(tx, collection, release).await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    #[tracing::instrument(skip(self, doc), fields(collection = %doc.collection, id = %doc.id))]
    async fn insert_document(&self, doc: &Document) -> DbResult<()> {
        let changes = DocumentChanges::from_document(doc)?;
        let mut conn = self.provider.get_connection().await?;
        conn.transaction::<_, DbError, _>(|tx| {
            async move {
                diesel::insert_into(document::table)
                    .values(&changes)
                    .execute(tx)
                    .await
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            DbError::DuplicateDocument {
                                collection: doc.collection.clone(),
                                id: doc.id.to_string(),
                            }
                        }
                        other => other.into(),
                    })?;
                index_history(tx, doc).await
            }
            .scope_boxed()
        })
        .await
    }

    #[tracing::instrument(skip(self, doc), fields(collection = %doc.collection, id = %doc.id))]
    async fn update_document(&self, doc: &Document) -> DbResult<()> {
        let changes = DocumentChanges::from_document(doc)?;
        let mut conn = self.provider.get_connection().await?;
        conn.transaction::<_, DbError, _>(|tx| {
            async move {
                let updated = diesel::update(
                    document::table
                        .filter(document::collection.eq(&doc.collection))
                        .filter(document::id.eq(doc.id.to_string())),
                )
                .set(&changes)
                .execute(tx)
                .await?;
                if updated == 0 {
                    return Err(DbError::DocumentNotFound {
                        collection: doc.collection.clone(),
                        id: doc.id.to_string(),
                    });
                }
                diesel::delete(
                    document_slug::table
                        .filter(document_slug::collection.eq(&doc.collection))
                        .filter(document_slug::document_id.eq(doc.id.to_string())),
                )
                .execute(tx)
                .await?;
                index_history(tx, doc).await
            }
            .scope_boxed()
        })
        .await
    }

    async fn load(&self, q: query::DocumentQuery) -> DbResult<Vec<Document>> {
        let mut conn = self.provider.get_connection().await?;
        let rows: Vec<DocumentRow> = q
            .select(DocumentRow::as_select())
            .load(&mut conn)
            .await?;
        rows.into_iter().map(DocumentRow::into_document).collect()
    }

    async fn by_ids(
        &self,
        siblings: &SiblingSet,
        ids: &[DocumentId],
        with_deleted: bool,
    ) -> DbResult<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut q = query::with_ids(query::in_siblings(siblings)?, ids);
        if !with_deleted {
            q = query::not_deleted(q);
        }
        self.load(q).await
    }

    async fn by_slugs(
        &self,
        siblings: &SiblingSet,
        slugs: &[String],
        with_deleted: bool,
    ) -> DbResult<Vec<Document>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }
        let mut q = query::history_contains_any(query::in_siblings(siblings)?, slugs);
        if !with_deleted {
            q = query::not_deleted(q);
        }
        self.load(q).await
    }

    /// ## Summary
    /// Loads one document by key, deleted or not.
    ///
    /// ## Errors
    /// Returns an error if the query fails or the row is malformed.
    pub async fn get(&self, collection: &str, id: &DocumentId) -> DbResult<Option<Document>> {
        Ok(self.load(query::by_key(collection, id)).await?.into_iter().next())
    }
}

/// Strips released values from one sibling's history and index rows.
async fn release_one(
    tx: &mut AsyncPgConnection,
    collection: &str,
    release: &SlugRelease,
) -> DbResult<()> {
    let id = release.id.to_string();
    let history: Option<Vec<String>> = document::table
        .filter(document::collection.eq(collection))
        .filter(document::id.eq(&id))
        .select(document::slug_history)
        .for_update()
        .first(tx)
        .await
        .optional()?;
    let Some(history) = history else {
        return Err(DbError::DocumentNotFound {
            collection: collection.to_string(),
            id,
        });
    };

    let mut history = SlugHistory::from(history);
    history.remove_all(&release.slugs);

    diesel::update(
        document::table
            .filter(document::collection.eq(collection))
            .filter(document::id.eq(&id)),
    )
    .set((
        document::slug_history.eq(history.into_vec()),
        document::updated_at.eq(chrono::Utc::now()),
    ))
    .execute(tx)
    .await?;

    diesel::delete(
        document_slug::table
            .filter(document_slug::collection.eq(collection))
            .filter(document_slug::document_id.eq(&id))
            .filter(document_slug::slug.eq_any(&release.slugs)),
    )
    .execute(tx)
    .await?;

    tracing::debug!(id = %release.id, slugs = ?release.slugs, "Released slugs");
    Ok(())
}

/// Inserts one index row per history value of `doc`.
async fn index_history(tx: &mut AsyncPgConnection, doc: &Document) -> DbResult<()> {
    let scope_key = doc.scope_key.as_deref().unwrap_or(doc.collection.as_str());
    let document_id = doc.id.to_string();
    for slug in doc.slug_history.iter() {
        let entry = NewSlugEntry {
            scope_key,
            slug,
            collection: &doc.collection,
            document_id: &document_id,
        };
        diesel::insert_into(document_slug::table)
            .values(&entry)
            .execute(tx)
            .await
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DbError::SlugTaken {
                        scope_key: scope_key.to_string(),
                        slug: slug.to_string(),
                    }
                }
                other => other.into(),
            })?;
    }
    Ok(())
}

impl<P: DbProvider> DocumentStore for PgDocumentStore<P> {
    async fn find_slug_conflicts(&self, query: &ConflictQuery<'_>) -> StoreResult<Vec<SlugHolder>> {
        Ok(self.conflicts(query).await?)
    }

    async fn release_slugs(&self, collection: &str, releases: &[SlugRelease]) -> StoreResult<()> {
        Ok(self.release(collection, releases).await?)
    }

    async fn insert(&self, document: &Document) -> StoreResult<()> {
        Ok(self.insert_document(document).await?)
    }

    async fn update(&self, document: &Document) -> StoreResult<()> {
        Ok(self.update_document(document).await?)
    }

    async fn find_by_ids(
        &self,
        siblings: &SiblingSet,
        ids: &[DocumentId],
        with_deleted: bool,
    ) -> StoreResult<Vec<Document>> {
        Ok(self.by_ids(siblings, ids, with_deleted).await?)
    }

    async fn find_by_slugs(
        &self,
        siblings: &SiblingSet,
        slugs: &[String],
        with_deleted: bool,
    ) -> StoreResult<Vec<Document>> {
        Ok(self.by_slugs(siblings, slugs, with_deleted).await?)
    }
}
