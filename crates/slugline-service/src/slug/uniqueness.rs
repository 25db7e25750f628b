//! Uniqueness resolution.
//!
//! ## Summary
//! Given a candidate token, finds the final slug for a document within its
//! scope: the token itself when nobody holds it, the token reclaimed from
//! other documents' stale history when only stale entries hold it, or the
//! token with a numeric suffix one above the highest suffix in use.

use slugline_core::model::Document;
use slugline_core::store::{ConflictQuery, DocumentStore, SlugHolder, SlugRelease};
use slugline_core::types::IdKind;
use slugline_core::util::slug::SlugPattern;

use crate::error::ServiceResult;

use super::options::SlugConfig;
use super::scope::ResolvedScope;

/// Conflicting values found in a scope, split by whether they are a
/// sibling's current slug.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Conflicts {
    pub active: Vec<String>,
    pub stale: Vec<SlugRelease>,
    /// Active and stale values together, plus the token itself when it is
    /// reserved or looks like an identifier.
    pub all: Vec<String>,
}

impl Conflicts {
    /// ## Summary
    /// Partitions every sibling's history values matching `pattern`: the last
    /// entry is the active slug, earlier matching entries are stale.
    #[must_use]
    pub fn partition(pattern: &SlugPattern, holders: Vec<SlugHolder>) -> Self {
        let mut conflicts = Self::default();
        for holder in holders {
            let last = holder.slug_history.len().saturating_sub(1);
            let mut stale = Vec::new();
            for (i, value) in holder.slug_history.into_iter().enumerate() {
                if !pattern.is_match(&value) {
                    continue;
                }
                if i == last {
                    conflicts.active.push(value.clone());
                } else {
                    stale.push(value.clone());
                }
                conflicts.all.push(value);
            }
            tracing::trace!(
                id = %holder.id,
                stale = stale.len(),
                "Partitioned sibling history"
            );
            if !stale.is_empty() {
                conflicts.stale.push(SlugRelease {
                    id: holder.id,
                    slugs: stale,
                });
            }
        }
        conflicts
    }

    fn stale_count(&self) -> usize {
        self.stale.iter().map(|r| r.slugs.len()).sum()
    }
}

/// ## Summary
/// Returns the reasons `token` may not be used as-is regardless of siblings:
/// it is a reserved word, or it would be classified as an identifier.
#[must_use]
pub fn self_conflicts(config: &SlugConfig, id_kind: IdKind, token: &str) -> Vec<&'static str> {
    let mut reasons = Vec::new();
    if config.reserved.is_reserved(token) {
        reasons.push("reserved");
    }
    if id_kind.looks_like(token) {
        reasons.push("identifier");
    }
    reasons
}

/// ## Summary
/// Returns `token-(max + 1)` where `max` is the highest numeric suffix among
/// `conflicts`. A bare `token` counts as suffix 0.
#[must_use]
pub fn next_suffixed(pattern: &SlugPattern, conflicts: &[String]) -> String {
    let max = conflicts
        .iter()
        .filter_map(|value| pattern.suffix_of(value))
        .map(|suffix| suffix.unwrap_or(0))
        .max()
        .unwrap_or(0);
    format!("{}-{}", pattern.token(), max.saturating_add(1))
}

/// ## Summary
/// Computes the final unique slug for `document` from the candidate `token`.
///
/// When the token is only held as stale history by siblings of a configured
/// scope, those stale entries are released in the store before returning.
///
/// ## Errors
/// Returns an error if the pattern cannot be built or a store call fails.
#[tracing::instrument(skip(store, config, document, scope), fields(id = %document.id, scope_key = %scope.key))]
pub async fn resolve_unique<S: DocumentStore>(
    store: &S,
    config: &SlugConfig,
    id_kind: IdKind,
    document: &Document,
    scope: &ResolvedScope,
    token: &str,
) -> ServiceResult<String> {
    let pattern = SlugPattern::new(token)?;
    let query = ConflictQuery {
        siblings: &scope.siblings,
        filter: scope.filter.as_ref(),
        pattern: &pattern,
        exclude: &document.id,
    };
    let holders = store.find_slug_conflicts(&query).await?;
    let mut conflicts = Conflicts::partition(&pattern, holders);

    let reasons = self_conflicts(config, id_kind, token);
    if !reasons.is_empty() {
        tracing::debug!(slug = %token, reasons = ?reasons, "Token conflicts with itself");
        conflicts.all.push(token.to_string());
    }

    if !conflicts.all.iter().any(|value| value == token) {
        tracing::debug!(slug = %token, "No collision");
        return Ok(token.to_string());
    }

    if config.scope.is_configured()
        && conflicts.active.is_empty()
        && !conflicts.stale.is_empty()
        && reasons.is_empty()
    {
        tracing::debug!(
            slug = %token,
            siblings = conflicts.stale.len(),
            released = conflicts.stale_count(),
            "Reclaiming slug from stale history"
        );
        store
            .release_slugs(scope.siblings.collection(), &conflicts.stale)
            .await?;
        return Ok(token.to_string());
    }

    let slug = next_suffixed(&pattern, &conflicts.all);
    tracing::debug!(
        slug = %slug,
        conflicts = conflicts.all.len(),
        "Collision resolved with suffix"
    );
    Ok(slug)
}
