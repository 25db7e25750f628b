//! Scope resolution.
//!
//! ## Summary
//! Turns a document and its type's [`ScopeDescriptor`] into the concrete
//! sibling set and filter a uniqueness query runs against, plus the scope
//! key the store indexes the document's slug history under.

use serde_json::Value;

use slugline_core::constants::SCOPE_KEY_SEPARATOR;
use slugline_core::model::Document;
use slugline_core::store::{FieldFilter, SiblingSet};

use super::options::ScopeDescriptor;

/// Where uniqueness is enforced for one document at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScope {
    pub siblings: SiblingSet,
    /// Equality filter applied on top of `siblings` for field scopes.
    pub filter: Option<FieldFilter>,
    /// Key of the uniqueness domain in the store's index.
    pub key: String,
}

/// ## Summary
/// Resolves the uniqueness scope of `document`.
///
/// Association scopes fall back to the root collection while the document
/// has no parent reference. Embedded documents without an embedding parent
/// are treated as root documents.
#[must_use]
pub fn resolve(descriptor: &ScopeDescriptor, document: &Document) -> ResolvedScope {
    let collection = document.collection.clone();
    match descriptor {
        ScopeDescriptor::None => root(collection),
        ScopeDescriptor::Association {
            foreign_key,
            inverse_of,
            ..
        } => match document.field_text(foreign_key) {
            Some(parent_key) => {
                let key = format!(
                    "{collection}{SCOPE_KEY_SEPARATOR}{foreign_key}={parent_key}"
                );
                ResolvedScope {
                    siblings: SiblingSet::Association {
                        collection,
                        foreign_key: foreign_key.clone(),
                        parent_key,
                        inverse_of: inverse_of.clone(),
                    },
                    filter: None,
                    key,
                }
            }
            None => root(collection),
        },
        ScopeDescriptor::Field { name } => {
            let filter = field_filter(name, document);
            let key = format!(
                "{collection}{SCOPE_KEY_SEPARATOR}{name}={}",
                filter.key_text()
            );
            ResolvedScope {
                siblings: SiblingSet::Root { collection },
                filter: Some(filter),
                key,
            }
        }
        ScopeDescriptor::EmbeddedParent { relation, field } => {
            let Some(embedding) = document
                .embedded_in
                .as_ref()
                .filter(|e| &e.relation == relation)
            else {
                tracing::warn!(
                    id = %document.id,
                    relation = %relation,
                    "Embedded document has no parent; using root scope"
                );
                return root(collection);
            };
            let mut key = format!(
                "{collection}{SCOPE_KEY_SEPARATOR}{relation}@{}",
                embedding.parent_id
            );
            let filter = field.as_deref().map(|name| field_filter(name, document));
            if let Some(filter) = &filter {
                key.push(SCOPE_KEY_SEPARATOR);
                key.push_str(&filter.field);
                key.push('=');
                key.push_str(&filter.key_text());
            }
            ResolvedScope {
                siblings: SiblingSet::Embedded {
                    collection,
                    parent_id: embedding.parent_id.clone(),
                    relation: relation.clone(),
                },
                filter,
                key,
            }
        }
    }
}

fn root(collection: String) -> ResolvedScope {
    ResolvedScope {
        key: collection.clone(),
        siblings: SiblingSet::Root { collection },
        filter: None,
    }
}

fn field_filter(name: &str, document: &Document) -> FieldFilter {
    FieldFilter {
        field: name.to_string(),
        value: document.field(name).cloned().unwrap_or(Value::Null),
    }
}
