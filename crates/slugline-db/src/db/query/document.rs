//! Query builder functions for documents.
//!
//! ## Summary
//! Sibling sets and filters of the persistence contract translated to boxed
//! Diesel queries. JSONB and array predicates Diesel has no DSL for are
//! written as SQL fragments with bound parameters.

use diesel::dsl::sql;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Jsonb, Text};

use slugline_core::model::Embedding;
use slugline_core::store::{FieldFilter, SiblingSet};
use slugline_core::types::DocumentId;
use slugline_core::util::slug::SlugPattern;

use crate::db::schema::document;
use crate::error::DbResult;

pub type DocumentQuery = document::BoxedQuery<'static, Pg>;

/// ## Summary
/// Returns a query to select all documents.
#[must_use]
pub fn all() -> DocumentQuery {
    document::table.into_boxed()
}

/// ## Summary
/// Returns a query to find a document by its key.
#[must_use]
pub fn by_key(collection: &str, id: &DocumentId) -> DocumentQuery {
    all()
        .filter(document::collection.eq(collection.to_string()))
        .filter(document::id.eq(id.to_string()))
}

/// ## Summary
/// Returns a query restricted to the documents of `siblings`.
///
/// ## Errors
/// Returns an error if an embedding parent cannot be serialized.
pub fn in_siblings(siblings: &SiblingSet) -> DbResult<DocumentQuery> {
    let query = all().filter(document::collection.eq(siblings.collection().to_string()));
    Ok(match siblings {
        SiblingSet::Root { .. } => query,
        SiblingSet::Association {
            foreign_key,
            parent_key,
            ..
        } => query.filter(
            sql::<Bool>("(document.fields ->> ")
                .bind::<Text, _>(foreign_key.clone())
                .sql(") = ")
                .bind::<Text, _>(parent_key.clone()),
        ),
        SiblingSet::Embedded {
            parent_id,
            relation,
            ..
        } => {
            let embedding = serde_json::to_value(Embedding {
                parent_id: parent_id.clone(),
                relation: relation.clone(),
            })?;
            query.filter(document::embedded_in.eq(embedding))
        }
    })
}

/// ## Summary
/// Restricts `query` to documents whose raw field value equals the filter's.
/// A missing field compares as JSON null.
#[must_use]
pub fn field_equals(query: DocumentQuery, filter: &FieldFilter) -> DocumentQuery {
    query.filter(
        sql::<Bool>("COALESCE(document.fields -> ")
            .bind::<Text, _>(filter.field.clone())
            .sql(", 'null'::jsonb) = ")
            .bind::<Jsonb, _>(filter.value.clone()),
    )
}

/// ## Summary
/// Restricts `query` to documents with a history value matching `pattern`.
#[must_use]
pub fn history_matches(query: DocumentQuery, pattern: &SlugPattern) -> DocumentQuery {
    query.filter(
        sql::<Bool>("EXISTS (SELECT 1 FROM unnest(document.slug_history) AS h(slug) WHERE h.slug ~ ")
            .bind::<Text, _>(pattern.as_str().to_string())
            .sql(")"),
    )
}

/// ## Summary
/// Restricts `query` to documents whose history contains any of `slugs`.
#[must_use]
pub fn history_contains_any(query: DocumentQuery, slugs: &[String]) -> DocumentQuery {
    query.filter(document::slug_history.overlaps_with(slugs.to_vec()))
}

#[must_use]
pub fn with_ids(query: DocumentQuery, ids: &[DocumentId]) -> DocumentQuery {
    let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
    query.filter(document::id.eq_any(ids))
}

#[must_use]
pub fn excluding(query: DocumentQuery, id: &DocumentId) -> DocumentQuery {
    query.filter(document::id.ne(id.to_string()))
}

#[must_use]
pub fn not_deleted(query: DocumentQuery) -> DocumentQuery {
    query.filter(document::deleted_at.is_null())
}
