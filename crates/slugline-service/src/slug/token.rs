use slugline_core::model::Document;
use slugline_core::util::slug::truncate_token;

use super::options::SlugConfig;

/// ## Summary
/// Raw slug text for `document`: the requested slug if any, else the custom
/// builder's output, else the source fields joined by a single space.
///
/// Missing and null fields are skipped.
#[must_use]
pub fn raw_text(config: &SlugConfig, document: &Document) -> String {
    if let Some(requested) = &document.requested_slug {
        return requested.clone();
    }
    if let Some(builder) = &config.builder {
        return builder(document);
    }
    config
        .fields
        .iter()
        .filter_map(|field| document.field_text(field))
        .collect::<Vec<_>>()
        .join(" ")
}

/// ## Summary
/// Builds the candidate token for `document`: raw text, normalized, then cut
/// to the configured maximum length. May be empty.
#[must_use]
pub fn build_token(config: &SlugConfig, document: &Document) -> String {
    let token = config.normalizer.normalize(&raw_text(config, document));
    match config.max_length {
        Some(max) => truncate_token(&token, max),
        None => token,
    }
}
