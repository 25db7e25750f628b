use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::history::SlugHistory;
use crate::types::DocumentId;

/// The embedding parent of a document held inside another document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Embedding {
    pub parent_id: DocumentId,
    /// Name of the relation under which the parent holds this document.
    pub relation: String,
}

/// A schemaless document with a slug history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Root type of the inheritance chain; subtypes share its storage.
    pub collection: String,
    /// Concrete type of this document.
    pub doc_type: String,
    pub fields: Map<String, Value>,
    pub slug_history: SlugHistory,
    pub embedded_in: Option<Embedding>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Scope key the slug history was last indexed under.
    pub scope_key: Option<String>,
    /// Explicit slug to use as raw text on the next generation.
    #[serde(skip)]
    pub requested_slug: Option<String>,
    /// Fields as last loaded or persisted; `None` for new records.
    #[serde(skip)]
    persisted_fields: Option<Map<String, Value>>,
    #[serde(skip)]
    persisted_history: SlugHistory,
    #[serde(skip)]
    persisted_scope_key: Option<String>,
}

impl Document {
    #[must_use]
    pub fn new(id: DocumentId, collection: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            id,
            collection: collection.into(),
            doc_type: doc_type.into(),
            fields: Map::new(),
            slug_history: SlugHistory::new(),
            embedded_in: None,
            deleted_at: None,
            scope_key: None,
            requested_slug: None,
            persisted_fields: None,
            persisted_history: SlugHistory::new(),
            persisted_scope_key: None,
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    #[must_use]
    pub fn embedded(mut self, parent_id: DocumentId, relation: impl Into<String>) -> Self {
        self.embedded_in = Some(Embedding {
            parent_id,
            relation: relation.into(),
        });
        self
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// ## Summary
    /// Returns the string representation of a field for slug building.
    ///
    /// Strings are returned verbatim, numbers and booleans via `to_string`,
    /// arrays and objects as compact JSON. Null and missing fields are `None`.
    #[must_use]
    pub fn field_text(&self, name: &str) -> Option<String> {
        value_text(self.fields.get(name)?)
    }

    /// Requests an explicit slug for the next generation.
    pub fn request_slug(&mut self, slug: impl Into<String>) {
        self.requested_slug = Some(slug.into());
    }

    #[must_use]
    pub const fn is_new_record(&self) -> bool {
        self.persisted_fields.is_none()
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// ## Summary
    /// Returns `true` if the field differs from its persisted value.
    ///
    /// Every field of a new record counts as changed.
    #[must_use]
    pub fn field_changed(&self, name: &str) -> bool {
        match &self.persisted_fields {
            None => true,
            Some(persisted) => persisted.get(name) != self.fields.get(name),
        }
    }

    /// Returns `true` if any field differs from its persisted value.
    #[must_use]
    pub fn any_field_changed(&self) -> bool {
        self.persisted_fields
            .as_ref()
            .is_none_or(|persisted| persisted != &self.fields)
    }

    /// ## Summary
    /// Snapshots the current fields, slug history and scope key as the
    /// persisted state. A requested slug has been written and is consumed.
    pub fn mark_persisted(&mut self) {
        self.persisted_fields = Some(self.fields.clone());
        self.persisted_history = self.slug_history.clone();
        self.persisted_scope_key = self.scope_key.clone();
        self.requested_slug = None;
    }

    /// ## Summary
    /// Drops slug changes that were never written: the history and scope key
    /// return to their persisted values, which are empty for new records.
    ///
    /// A requested slug is kept so the next generation can use it again.
    pub fn discard_unsaved_slug(&mut self) {
        self.slug_history = self.persisted_history.clone();
        self.scope_key = self.persisted_scope_key.clone();
    }

    #[must_use]
    pub fn current_slug(&self) -> Option<&str> {
        self.slug_history.current()
    }

    /// URL parameter for this document: the current slug, or the identifier.
    #[must_use]
    pub fn to_param(&self) -> String {
        self.current_slug()
            .map_or_else(|| self.id.to_string(), str::to_string)
    }
}

/// String representation of a JSON value used for slug text and scope keys.
#[must_use]
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
