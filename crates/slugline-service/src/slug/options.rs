//! Per-type slug configuration.
//!
//! ## Summary
//! [`SlugOptions`] is what callers declare when registering a document type.
//! Registration resolves it once into an immutable [`SlugConfig`], which is
//! then passed into every slug operation on that type.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use slugline_core::model::Document;
use slugline_core::util::slug::{DefaultNormalizer, Normalizer};

/// Custom token builder: computes the raw slug text for a document.
pub type BuildFn = Arc<dyn Fn(&Document) -> String + Send + Sync>;

/// Declared slug options for a document type.
#[derive(Clone, Default)]
pub struct SlugOptions {
    pub(crate) fields: Vec<String>,
    pub(crate) scope: Option<ScopeRequest>,
    pub(crate) history: bool,
    pub(crate) permanent: bool,
    pub(crate) reserved: Vec<String>,
    pub(crate) reserved_patterns: Vec<Regex>,
    pub(crate) max_length: Option<usize>,
    pub(crate) builder: Option<BuildFn>,
    pub(crate) normalizer: Option<Arc<dyn Normalizer>>,
}

/// How a declared scope name should be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScopeRequest {
    /// Association if one is declared under this name, otherwise a field.
    Auto(String),
    /// Declared as an association; degrades to a field when none exists.
    Association(String),
}

impl ScopeRequest {
    pub(crate) fn name(&self) -> &str {
        match self {
            Self::Auto(name) | Self::Association(name) => name,
        }
    }
}

impl SlugOptions {
    /// Slug built from `fields`, concatenated in order with single spaces.
    #[must_use]
    pub fn new<I, F>(fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Scope uniqueness to an association or a plain field.
    #[must_use]
    pub fn scope(mut self, name: impl Into<String>) -> Self {
        self.scope = Some(ScopeRequest::Auto(name.into()));
        self
    }

    /// Scope uniqueness to an association. Falls back to a field scope when
    /// the type declares no association under this name.
    #[must_use]
    pub fn scope_association(mut self, name: impl Into<String>) -> Self {
        self.scope = Some(ScopeRequest::Association(name.into()));
        self
    }

    #[must_use]
    pub const fn history(mut self, history: bool) -> Self {
        self.history = history;
        self
    }

    #[must_use]
    pub const fn permanent(mut self, permanent: bool) -> Self {
        self.permanent = permanent;
        self
    }

    #[must_use]
    pub fn reserve<I, W>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        self.reserved.extend(words.into_iter().map(Into::into));
        self
    }

    /// Reserve every token the regex matches.
    #[must_use]
    pub fn reserve_pattern(mut self, pattern: Regex) -> Self {
        self.reserved_patterns.push(pattern);
        self
    }

    #[must_use]
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Replace field concatenation with a custom builder.
    #[must_use]
    pub fn build_with<F>(mut self, builder: F) -> Self
    where
        F: Fn(&Document) -> String + Send + Sync + 'static,
    {
        self.builder = Some(Arc::new(builder));
        self
    }

    #[must_use]
    pub fn normalizer<N>(mut self, normalizer: N) -> Self
    where
        N: Normalizer + 'static,
    {
        self.normalizer = Some(Arc::new(normalizer));
        self
    }
}

impl fmt::Debug for SlugOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlugOptions")
            .field("fields", &self.fields)
            .field("scope", &self.scope)
            .field("history", &self.history)
            .field("permanent", &self.permanent)
            .field("reserved", &self.reserved)
            .field("reserved_patterns", &self.reserved_patterns)
            .field("max_length", &self.max_length)
            .field("custom_builder", &self.builder.is_some())
            .field("custom_normalizer", &self.normalizer.is_some())
            .finish()
    }
}

/// Where uniqueness is enforced, resolved once at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDescriptor {
    /// All documents of the root type.
    None,
    /// Documents sharing the same parent through `foreign_key`.
    Association {
        name: String,
        foreign_key: String,
        inverse_of: String,
    },
    /// Documents sharing the same raw value of `name`.
    Field { name: String },
    /// Siblings embedded in the same parent under `relation`, optionally
    /// narrowed to those sharing the value of `field`.
    EmbeddedParent {
        relation: String,
        field: Option<String>,
    },
}

impl ScopeDescriptor {
    /// Returns `true` when a scope option was declared, which enables slug
    /// reclamation from stale history.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        match self {
            Self::None => false,
            Self::Association { .. } | Self::Field { .. } => true,
            Self::EmbeddedParent { field, .. } => field.is_some(),
        }
    }

    /// The field whose change moves a document to a different scope.
    #[must_use]
    pub fn tracked_field(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Association { foreign_key, .. } => Some(foreign_key),
            Self::Field { name } => Some(name),
            Self::EmbeddedParent { field, .. } => field.as_deref(),
        }
    }
}

/// Words and patterns a final slug may never equal.
#[derive(Debug, Clone, Default)]
pub struct ReservedWords {
    exact: BTreeSet<String>,
    patterns: Vec<Regex>,
}

impl ReservedWords {
    #[must_use]
    pub fn new<I, W>(words: I, patterns: Vec<Regex>) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        Self {
            exact: words.into_iter().map(Into::into).collect(),
            patterns,
        }
    }

    /// Exact, case-sensitive equality or a pattern match.
    #[must_use]
    pub fn is_reserved(&self, token: &str) -> bool {
        self.exact.contains(token) || self.patterns.iter().any(|p| p.is_match(token))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.len() + self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.patterns.is_empty()
    }
}

/// Resolved slug configuration of a document type.
#[derive(Clone)]
pub struct SlugConfig {
    pub(crate) fields: Vec<String>,
    pub(crate) builder: Option<BuildFn>,
    pub(crate) normalizer: Arc<dyn Normalizer>,
    pub(crate) scope: ScopeDescriptor,
    pub(crate) history: bool,
    pub(crate) permanent: bool,
    pub(crate) reserved: ReservedWords,
    pub(crate) max_length: Option<usize>,
}

impl SlugConfig {
    pub(crate) fn from_options(
        options: SlugOptions,
        scope: ScopeDescriptor,
        default_reserved: &[String],
        default_max_length: Option<usize>,
    ) -> Self {
        let reserved = ReservedWords::new(
            default_reserved.iter().cloned().chain(options.reserved),
            options.reserved_patterns,
        );
        Self {
            fields: options.fields,
            builder: options.builder,
            normalizer: options
                .normalizer
                .unwrap_or_else(|| Arc::new(DefaultNormalizer)),
            scope,
            history: options.history,
            permanent: options.permanent,
            reserved,
            max_length: options.max_length.or(default_max_length),
        }
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub const fn scope(&self) -> &ScopeDescriptor {
        &self.scope
    }

    #[must_use]
    pub const fn keeps_history(&self) -> bool {
        self.history
    }

    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        self.permanent
    }

    #[must_use]
    pub const fn reserved(&self) -> &ReservedWords {
        &self.reserved
    }

    #[must_use]
    pub const fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// ## Summary
    /// Returns `true` if a change to `document` calls for a new slug: a source
    /// field or the scope field changed. With no source fields declared (custom
    /// builder only) any field change counts.
    #[must_use]
    pub fn tracked_fields_changed(&self, document: &Document) -> bool {
        if self.fields.is_empty() {
            return document.any_field_changed();
        }
        self.fields
            .iter()
            .map(String::as_str)
            .chain(self.scope.tracked_field())
            .any(|field| document.field_changed(field))
    }
}

impl fmt::Debug for SlugConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlugConfig")
            .field("fields", &self.fields)
            .field("custom_builder", &self.builder.is_some())
            .field("scope", &self.scope)
            .field("history", &self.history)
            .field("permanent", &self.permanent)
            .field("reserved", &self.reserved)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}
