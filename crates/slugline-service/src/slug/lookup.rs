//! Lookup by identifier or slug.
//!
//! ## Summary
//! Callers pass a list of arguments that may be identifiers or slugs. The
//! whole list is classified once: identifiers when every argument reads as
//! an identifier of the type's kind, slugs when every argument is text,
//! ambiguous otherwise. Callers can force either interpretation.

use std::fmt;

use slugline_core::model::Document;
use slugline_core::store::{DocumentStore, SiblingSet};
use slugline_core::types::{DocumentId, IdKind};

use crate::error::{ServiceError, ServiceResult};

use super::registry::TypeRegistry;

/// One caller-supplied lookup argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupArg {
    Text(String),
    Integer(i64),
    Uuid(uuid::Uuid),
}

impl LookupArg {
    /// Reads the argument as an identifier of `kind`, if it is one.
    #[must_use]
    pub fn as_id(&self, kind: IdKind) -> Option<DocumentId> {
        match (self, kind) {
            (Self::Text(text), kind) => kind.parse(text),
            (Self::Integer(n), IdKind::Integer) => Some(DocumentId::Integer(*n)),
            (Self::Uuid(uuid), IdKind::Uuid) => Some(DocumentId::Uuid(*uuid)),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl fmt::Display for LookupArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Uuid(uuid) => write!(f, "{uuid}"),
        }
    }
}

impl From<&str> for LookupArg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for LookupArg {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for LookupArg {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<uuid::Uuid> for LookupArg {
    fn from(value: uuid::Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<&DocumentId> for LookupArg {
    fn from(value: &DocumentId) -> Self {
        match value {
            DocumentId::Integer(n) => Self::Integer(*n),
            DocumentId::Uuid(uuid) => Self::Uuid(*uuid),
            DocumentId::ObjectId(oid) => Self::Text(oid.to_string()),
        }
    }
}

/// How lookup arguments are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LookupMode {
    #[default]
    Auto,
    ForceSlug,
    ForceIdentifier,
}

#[derive(Debug, Clone, Default)]
pub struct LookupOptions {
    pub mode: LookupMode,
    /// Include soft-deleted documents.
    pub with_deleted: bool,
    /// Search one scope's siblings instead of the whole root collection.
    pub within: Option<SiblingSet>,
}

impl LookupOptions {
    #[must_use]
    pub fn force_slug() -> Self {
        Self {
            mode: LookupMode::ForceSlug,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn force_identifier() -> Self {
        Self {
            mode: LookupMode::ForceIdentifier,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_deleted(mut self, with_deleted: bool) -> Self {
        self.with_deleted = with_deleted;
        self
    }

    #[must_use]
    pub fn within(mut self, siblings: SiblingSet) -> Self {
        self.within = Some(siblings);
        self
    }
}

/// Interpretation of a whole argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Identifier,
    Slug,
}

/// ## Summary
/// Classifies `args` for a type whose identifiers are of `kind`.
///
/// Returns `None` when the list mixes kinds and needs an explicit override.
#[must_use]
pub fn classify(kind: IdKind, args: &[LookupArg]) -> Option<Classification> {
    if args.iter().all(|arg| arg.as_id(kind).is_some()) {
        Some(Classification::Identifier)
    } else if args.iter().all(LookupArg::is_text) {
        Some(Classification::Slug)
    } else {
        None
    }
}

/// ## Summary
/// Finds documents of `type_name` (and its subtypes) matching every argument.
///
/// Results are deduplicated and ordered by the first argument each document
/// matched. An empty argument list returns nothing.
///
/// ## Errors
/// - `UnknownType` if `type_name` is not registered
/// - `AmbiguousLookup` if the arguments cannot be classified
/// - `NotFound` listing every argument that matched no document
#[tracing::instrument(skip(store, registry, args, options), fields(args = args.len(), mode = ?options.mode))]
pub async fn find_documents<S: DocumentStore>(
    store: &S,
    registry: &TypeRegistry,
    type_name: &str,
    args: &[LookupArg],
    options: &LookupOptions,
) -> ServiceResult<Vec<Document>> {
    let ty = registry.get(type_name)?;
    if args.is_empty() {
        return Ok(Vec::new());
    }

    let classification = match options.mode {
        LookupMode::Auto => classify(ty.id_kind, args).ok_or_else(|| {
            ServiceError::AmbiguousLookup {
                type_name: type_name.to_string(),
            }
        })?,
        LookupMode::ForceSlug => Classification::Slug,
        LookupMode::ForceIdentifier => Classification::Identifier,
    };
    tracing::debug!(classification = ?classification, "Classified lookup");

    let siblings = options.within.clone().unwrap_or_else(|| SiblingSet::Root {
        collection: ty.collection.clone(),
    });
    let types = registry.descendants(type_name);

    let mut found: Vec<Document> = Vec::new();
    let mut missing = Vec::new();

    match classification {
        Classification::Identifier => {
            let keys: Vec<Option<DocumentId>> =
                args.iter().map(|arg| arg.as_id(ty.id_kind)).collect();
            let ids: Vec<DocumentId> = keys.iter().flatten().cloned().collect();
            let candidates = store
                .find_by_ids(&siblings, &ids, options.with_deleted)
                .await?;
            for (arg, key) in args.iter().zip(&keys) {
                let matches = candidates.iter().filter(|doc| {
                    types.contains(doc.doc_type.as_str()) && Some(&doc.id) == key.as_ref()
                });
                collect(arg, matches, &mut found, &mut missing);
            }
        }
        Classification::Slug => {
            let slugs: Vec<String> = args.iter().map(ToString::to_string).collect();
            let candidates = store
                .find_by_slugs(&siblings, &slugs, options.with_deleted)
                .await?;
            for (arg, slug) in args.iter().zip(&slugs) {
                let matches = candidates.iter().filter(|doc| {
                    types.contains(doc.doc_type.as_str()) && doc.slug_history.contains(slug)
                });
                collect(arg, matches, &mut found, &mut missing);
            }
        }
    }

    if !missing.is_empty() {
        return Err(ServiceError::NotFound {
            type_name: type_name.to_string(),
            missing,
        });
    }
    Ok(found)
}

fn collect<'a>(
    arg: &LookupArg,
    matches: impl Iterator<Item = &'a Document>,
    found: &mut Vec<Document>,
    missing: &mut Vec<String>,
) {
    let mut any = false;
    for doc in matches {
        any = true;
        if !found.iter().any(|f| f.id == doc.id) {
            found.push(doc.clone());
        }
    }
    if !any {
        missing.push(arg.to_string());
    }
}
