use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde_json::Value;

use slugline_core::model::{Document, Embedding, SlugHistory};
use slugline_core::types::DocumentId;

use crate::db::enums::IdKindColumn;
use crate::db::schema;
use crate::error::{DbError, DbResult};

/// Stored document row.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = schema::document)]
#[diesel(check_for_backend(Pg))]
pub struct DocumentRow {
    pub collection: String,
    pub id: String,
    pub id_kind: IdKindColumn,
    pub doc_type: String,
    pub fields: Value,
    pub slug_history: Vec<String>,
    pub scope_key: Option<String>,
    pub embedded_in: Option<Value>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRow {
    /// ## Summary
    /// Converts the row into a persisted [`Document`].
    ///
    /// ## Errors
    /// Returns an error if the identifier does not parse as its recorded kind,
    /// `fields` is not a JSON object, or `embedded_in` is malformed.
    pub fn into_document(self) -> DbResult<Document> {
        let id = DocumentId::parse(self.id_kind.into(), &self.id)?;
        let Value::Object(fields) = self.fields else {
            return Err(DbError::MalformedRow {
                collection: self.collection,
                id: self.id,
                reason: "fields is not an object",
            });
        };
        let embedded_in = self
            .embedded_in
            .map(serde_json::from_value::<Embedding>)
            .transpose()?;

        let mut document = Document::new(id, self.collection, self.doc_type);
        document.fields = fields;
        document.slug_history = SlugHistory::from(self.slug_history);
        document.scope_key = self.scope_key;
        document.embedded_in = embedded_in;
        document.deleted_at = self.deleted_at;
        document.mark_persisted();
        Ok(document)
    }
}

/// Column values written on insert and update.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = schema::document)]
#[diesel(primary_key(collection, id))]
#[diesel(treat_none_as_null = true)]
pub struct DocumentChanges {
    pub collection: String,
    pub id: String,
    pub id_kind: IdKindColumn,
    pub doc_type: String,
    pub fields: Value,
    pub slug_history: Vec<String>,
    pub scope_key: Option<String>,
    pub embedded_in: Option<Value>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentChanges {
    /// ## Summary
    /// Captures the storable state of `document`.
    ///
    /// ## Errors
    /// Returns an error if the embedding cannot be serialized.
    pub fn from_document(document: &Document) -> DbResult<Self> {
        Ok(Self {
            collection: document.collection.clone(),
            id: document.id.to_string(),
            id_kind: document.id.kind().into(),
            doc_type: document.doc_type.clone(),
            fields: Value::Object(document.fields.clone()),
            slug_history: document.slug_history.as_slice().to_vec(),
            scope_key: document.scope_key.clone(),
            embedded_in: document
                .embedded_in
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
            deleted_at: document.deleted_at,
            updated_at: Utc::now(),
        })
    }
}

/// One entry of the slug uniqueness index.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::document_slug)]
pub struct NewSlugEntry<'a> {
    pub scope_key: &'a str,
    pub slug: &'a str,
    pub collection: &'a str,
    pub document_id: &'a str,
}
