//! Document type registration.
//!
//! ## Summary
//! Types are registered once, parents before children. Registration resolves
//! everything the slug engine needs about a type: its root collection, its
//! identifier kind, its associations and its [`SlugConfig`] with a statically
//! resolved [`ScopeDescriptor`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use slugline_core::config::SlugSettings;
use slugline_core::model::Document;
use slugline_core::types::{DocumentId, IdKind};

use crate::error::{ServiceError, ServiceResult};

use super::options::{ScopeDescriptor, ScopeRequest, SlugConfig, SlugOptions};

/// A reference from a document to its parent through a foreign-key field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub name: String,
    pub foreign_key: String,
    /// Name of the parent's relation holding documents of this type.
    pub inverse_of: Option<String>,
}

impl Association {
    #[must_use]
    pub fn new(name: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            foreign_key: foreign_key.into(),
            inverse_of: None,
        }
    }

    /// Names the inverse relation when it isn't the default plural of the type.
    #[must_use]
    pub fn inverse_of(mut self, relation: impl Into<String>) -> Self {
        self.inverse_of = Some(relation.into());
        self
    }
}

/// Declaration of a document type.
#[derive(Debug, Clone)]
pub struct TypeDefinition {
    name: String,
    parent: Option<String>,
    id_kind: Option<IdKind>,
    associations: Vec<Association>,
    embedded_in: Option<String>,
    slug: Option<SlugOptions>,
}

impl TypeDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            id_kind: None,
            associations: Vec::new(),
            embedded_in: None,
            slug: None,
        }
    }

    #[must_use]
    pub const fn id_kind(mut self, id_kind: IdKind) -> Self {
        self.id_kind = Some(id_kind);
        self
    }

    /// Declares this type a subtype sharing the parent's storage and slug domain.
    #[must_use]
    pub fn inherits(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    /// Declares documents of this type embedded in a parent under `relation`.
    #[must_use]
    pub fn embedded_in(mut self, relation: impl Into<String>) -> Self {
        self.embedded_in = Some(relation.into());
        self
    }

    #[must_use]
    pub fn slug(mut self, options: SlugOptions) -> Self {
        self.slug = Some(options);
        self
    }
}

/// A registered, fully resolved document type.
#[derive(Debug, Clone)]
pub struct RegisteredType {
    pub name: String,
    pub parent: Option<String>,
    /// Root type of the inheritance chain.
    pub collection: String,
    pub id_kind: IdKind,
    pub associations: Vec<Association>,
    pub embedded_in: Option<String>,
    slug: Option<Arc<SlugConfig>>,
}

impl RegisteredType {
    #[must_use]
    pub fn slug_config(&self) -> Option<&SlugConfig> {
        self.slug.as_deref()
    }

    #[must_use]
    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.name == name)
    }
}

/// All registered document types.
#[derive(Debug)]
pub struct TypeRegistry {
    types: HashMap<String, RegisteredType>,
    defaults: SlugSettings,
}

impl TypeRegistry {
    /// A registry without process-wide reserved words or length limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            defaults: SlugSettings {
                reserved: Vec::new(),
                max_length: None,
            },
        }
    }

    /// A registry merging `settings` into every slug configuration.
    #[must_use]
    pub fn with_settings(settings: SlugSettings) -> Self {
        Self {
            types: HashMap::new(),
            defaults: settings,
        }
    }

    /// ## Summary
    /// Registers a document type.
    ///
    /// Subtypes inherit the parent's root collection, identifier kind,
    /// associations, embedding and, unless they declare their own, slug
    /// configuration.
    ///
    /// ## Errors
    /// - `InvalidConfiguration` if the name is taken or a subtype declares a
    ///   different identifier kind than its parent
    /// - `UnknownType` if the parent is not registered
    #[tracing::instrument(skip(self, definition), fields(type_name = %definition.name))]
    pub fn register(&mut self, definition: TypeDefinition) -> ServiceResult<&RegisteredType> {
        if self.types.contains_key(&definition.name) {
            return Err(ServiceError::InvalidConfiguration(format!(
                "type {} is already registered",
                definition.name
            )));
        }

        let parent = match &definition.parent {
            Some(parent) => Some(self.get(parent)?.clone()),
            None => None,
        };

        let id_kind = match (&parent, definition.id_kind) {
            (Some(parent), Some(kind)) if kind != parent.id_kind => {
                return Err(ServiceError::InvalidConfiguration(format!(
                    "type {} declares id kind {kind} but its parent {} uses {}",
                    definition.name, parent.name, parent.id_kind
                )));
            }
            (Some(parent), _) => parent.id_kind,
            (None, kind) => kind.unwrap_or(IdKind::Uuid),
        };

        let collection = parent
            .as_ref()
            .map_or_else(|| definition.name.clone(), |p| p.collection.clone());

        let mut associations = parent
            .as_ref()
            .map(|p| p.associations.clone())
            .unwrap_or_default();
        associations.extend(definition.associations);

        let embedded_in = definition
            .embedded_in
            .or_else(|| parent.as_ref().and_then(|p| p.embedded_in.clone()));

        let slug = match definition.slug {
            Some(options) => {
                let scope = resolve_scope_descriptor(
                    &definition.name,
                    options.scope.as_ref(),
                    &associations,
                    embedded_in.as_deref(),
                );
                Some(Arc::new(SlugConfig::from_options(
                    options,
                    scope,
                    &self.defaults.reserved,
                    self.defaults.max_length,
                )))
            }
            None => parent.as_ref().and_then(|p| p.slug.clone()),
        };

        tracing::debug!(
            collection = %collection,
            id_kind = %id_kind,
            slugged = slug.is_some(),
            "Registered document type"
        );

        let name = definition.name.clone();
        let registered = RegisteredType {
            name: definition.name,
            parent: definition.parent,
            collection,
            id_kind,
            associations,
            embedded_in,
            slug,
        };
        Ok(self.types.entry(name).or_insert(registered))
    }

    /// ## Summary
    /// Looks up a registered type.
    ///
    /// ## Errors
    /// Returns `UnknownType` if no type is registered under `name`.
    pub fn get(&self, name: &str) -> ServiceResult<&RegisteredType> {
        self.types
            .get(name)
            .ok_or_else(|| ServiceError::UnknownType(name.to_string()))
    }

    /// ## Summary
    /// Builds an empty, unsaved document of the given type.
    ///
    /// ## Errors
    /// - `UnknownType` if the type is not registered
    /// - `InvalidConfiguration` if `id` is of a different kind than the type's
    pub fn build(&self, type_name: &str, id: DocumentId) -> ServiceResult<Document> {
        let ty = self.get(type_name)?;
        if id.kind() != ty.id_kind {
            return Err(ServiceError::InvalidConfiguration(format!(
                "type {type_name} uses {} identifiers, got {}",
                ty.id_kind,
                id.kind()
            )));
        }
        Ok(Document::new(id, ty.collection.clone(), ty.name.clone()))
    }

    /// ## Summary
    /// Builds an empty, unsaved document with a generated identifier.
    ///
    /// ## Errors
    /// - `UnknownType` if the type is not registered
    /// - `InvalidConfiguration` if the type's identifiers are caller-assigned
    pub fn build_generated(&self, type_name: &str) -> ServiceResult<Document> {
        let ty = self.get(type_name)?;
        let id = ty.id_kind.generate().ok_or_else(|| {
            ServiceError::InvalidConfiguration(format!(
                "type {type_name} uses {} identifiers, which are assigned by the caller",
                ty.id_kind
            ))
        })?;
        self.build(type_name, id)
    }

    /// Names of `type_name` and every type inheriting from it.
    #[must_use]
    pub fn descendants(&self, type_name: &str) -> HashSet<&str> {
        self.types
            .values()
            .filter(|ty| self.is_a(&ty.name, type_name))
            .map(|ty| ty.name.as_str())
            .collect()
    }

    /// Returns `true` if `type_name` is `ancestor` or inherits from it.
    #[must_use]
    pub fn is_a(&self, type_name: &str, ancestor: &str) -> bool {
        let mut current = Some(type_name);
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            current = self.types.get(name).and_then(|ty| ty.parent.as_deref());
        }
        false
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_scope_descriptor(
    type_name: &str,
    scope: Option<&ScopeRequest>,
    associations: &[Association],
    embedded_in: Option<&str>,
) -> ScopeDescriptor {
    let Some(request) = scope else {
        return embedded_in.map_or(ScopeDescriptor::None, |relation| {
            ScopeDescriptor::EmbeddedParent {
                relation: relation.to_string(),
                field: None,
            }
        });
    };

    let name = request.name();
    if let Some(association) = associations.iter().find(|a| a.name == name) {
        if let Some(relation) = embedded_in {
            tracing::warn!(
                type_name = %type_name,
                scope = %name,
                relation = %relation,
                "Association scope on an embedded type; embedding is ignored for uniqueness"
            );
        }
        return ScopeDescriptor::Association {
            name: association.name.clone(),
            foreign_key: association.foreign_key.clone(),
            inverse_of: association
                .inverse_of
                .clone()
                .unwrap_or_else(|| default_inverse_name(type_name)),
        };
    }

    if matches!(request, ScopeRequest::Association(_)) {
        tracing::warn!(
            type_name = %type_name,
            scope = %name,
            "Scope declared as an association but none is registered; using field scope"
        );
    }

    match embedded_in {
        Some(relation) => ScopeDescriptor::EmbeddedParent {
            relation: relation.to_string(),
            field: Some(name.to_string()),
        },
        None => ScopeDescriptor::Field {
            name: name.to_string(),
        },
    }
}

/// Default name of a parent's relation to this type: snake case, plural.
fn default_inverse_name(type_name: &str) -> String {
    let mut snake = String::with_capacity(type_name.len() + 2);
    for (i, c) in type_name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                snake.push('_');
            }
            snake.push(c.to_ascii_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake.push('s');
    snake
}
