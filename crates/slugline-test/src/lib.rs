//! Slugline integration test support.
//!
//! Re-exports the workspace crates and registers the document types the
//! integration tests in `tests/` run against.

pub use slugline_core as core;
pub use slugline_db as db;
pub use slugline_service as service;

pub mod fixtures {
    use std::sync::Arc;

    use regex::Regex;

    use slugline_core::config::SlugSettings;
    use slugline_core::error::CoreError;
    use slugline_core::model::Document;
    use slugline_core::store::DocumentStore;
    use slugline_core::types::{DocumentId, IdKind};
    use slugline_service::ServiceResult;
    use slugline_service::slug::{
        Association, SlugEngine, SlugOptions, TypeDefinition, TypeRegistry,
    };

    /// Upper bound on slug length for every fixture type.
    pub const MAX_LENGTH: usize = 48;

    /// ## Summary
    /// Registers the fixture document types.
    ///
    /// | Type | Id | Slug |
    /// |------|----|------|
    /// | `page` | integer | `title`, reserves `admin` and `api-v<n>` |
    /// | `note` | integer | `title`, history, unscoped |
    /// | `article` | integer | `title`, history, scoped to the `site` association |
    /// | `post` | uuid | `title`, history, scoped to the `author` association |
    /// | `listing` | object id | `name`, scoped to the `city` field |
    /// | `comment` | integer | `title`, embedded in `comments` |
    /// | `section` | integer | `title`, embedded in `sections`, scoped to `lang` |
    /// | `content`, `landing`, `blog` | integer | `title`, one domain |
    /// | `ticket` | integer | `subject`, permanent |
    /// | `person` | integer | `last first` via a custom builder |
    ///
    /// ## Errors
    /// Returns an error if a definition is rejected.
    pub fn registry() -> ServiceResult<TypeRegistry> {
        let mut registry = TypeRegistry::with_settings(SlugSettings {
            max_length: Some(MAX_LENGTH),
            ..SlugSettings::default()
        });

        let api_versions = Regex::new("^api-v[0-9]+$").map_err(CoreError::from)?;
        registry.register(
            TypeDefinition::new("page").id_kind(IdKind::Integer).slug(
                SlugOptions::new(["title"])
                    .reserve(["admin"])
                    .reserve_pattern(api_versions),
            ),
        )?;
        registry.register(
            TypeDefinition::new("note")
                .id_kind(IdKind::Integer)
                .slug(SlugOptions::new(["title"]).history(true)),
        )?;
        registry.register(
            TypeDefinition::new("article")
                .id_kind(IdKind::Integer)
                .association(Association::new("site", "site_id"))
                .slug(SlugOptions::new(["title"]).scope("site").history(true)),
        )?;
        registry.register(
            TypeDefinition::new("post")
                .id_kind(IdKind::Uuid)
                .association(Association::new("author", "author_id"))
                .slug(SlugOptions::new(["title"]).scope("author").history(true)),
        )?;
        registry.register(
            TypeDefinition::new("listing")
                .id_kind(IdKind::ObjectId)
                .slug(SlugOptions::new(["name"]).scope("city")),
        )?;
        registry.register(
            TypeDefinition::new("comment")
                .id_kind(IdKind::Integer)
                .embedded_in("comments")
                .slug(SlugOptions::new(["title"])),
        )?;
        registry.register(
            TypeDefinition::new("section")
                .id_kind(IdKind::Integer)
                .embedded_in("sections")
                .slug(SlugOptions::new(["title"]).scope("lang")),
        )?;
        registry.register(
            TypeDefinition::new("content")
                .id_kind(IdKind::Integer)
                .slug(SlugOptions::new(["title"])),
        )?;
        registry.register(TypeDefinition::new("landing").inherits("content"))?;
        registry.register(TypeDefinition::new("blog").inherits("content"))?;
        registry.register(
            TypeDefinition::new("ticket")
                .id_kind(IdKind::Integer)
                .slug(SlugOptions::new(["subject"]).permanent(true)),
        )?;
        registry.register(
            TypeDefinition::new("person").id_kind(IdKind::Integer).slug(
                SlugOptions::new(["first", "last"]).build_with(|doc: &Document| {
                    format!(
                        "{} {}",
                        doc.field_text("last").unwrap_or_default(),
                        doc.field_text("first").unwrap_or_default()
                    )
                }),
            ),
        )?;

        Ok(registry)
    }

    /// ## Summary
    /// Builds an engine over `store` with the fixture types registered.
    ///
    /// ## Errors
    /// Returns an error if the registry cannot be built.
    pub fn engine<S: DocumentStore>(store: S) -> ServiceResult<SlugEngine<S>> {
        Ok(SlugEngine::new(store, Arc::new(registry()?)))
    }

    /// ## Summary
    /// Builds an unsaved document of an integer-keyed type with `title` set.
    ///
    /// ## Errors
    /// Returns an error if the type is unknown or not integer-keyed.
    pub fn titled<S: DocumentStore>(
        engine: &SlugEngine<S>,
        type_name: &str,
        id: i64,
        title: &str,
    ) -> ServiceResult<Document> {
        Ok(engine
            .registry()
            .build(type_name, DocumentId::Integer(id))?
            .with_field("title", title))
    }
}
