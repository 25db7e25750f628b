//! Query builder functions for the slug uniqueness index.

use diesel::pg::Pg;
use diesel::prelude::*;

use slugline_core::types::DocumentId;

use crate::db::schema::document_slug;

/// ## Summary
/// Returns a query for every index entry owned by a document.
#[must_use]
pub fn owned_by(collection: &str, id: &DocumentId) -> document_slug::BoxedQuery<'static, Pg> {
    document_slug::table
        .filter(document_slug::collection.eq(collection.to_string()))
        .filter(document_slug::document_id.eq(id.to_string()))
        .into_boxed()
}
