//! Slug text utilities: normalization into URL tokens and suffix patterns.
//!
//! ## Summary
//! A [`Normalizer`] turns raw builder output into a URL-safe token. The
//! [`SlugPattern`] for a token matches the token itself and every numbered
//! variant of it (`token-1`, `token-2`, ...), which is the set of values the
//! uniqueness resolver has to look at.

use regex::Regex;

use crate::error::CoreResult;

/// Turns arbitrary text into a URL-safe token.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, text: &str) -> String;
}

impl<F> Normalizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn normalize(&self, text: &str) -> String {
        self(text)
    }
}

/// Transliterates to ASCII, lowercases, and collapses everything that is not
/// alphanumeric into single hyphens.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNormalizer;

impl Normalizer for DefaultNormalizer {
    fn normalize(&self, text: &str) -> String {
        generate_slug(text)
    }
}

/// Generate a URL-safe slug from a name.
///
/// Examples:
/// - "My Calendar" -> "my-calendar"
/// - "John Doe's Contacts" -> "john-doe-s-contacts"
/// - "Crème Brûlée" -> "creme-brulee"
#[must_use]
pub fn generate_slug(name: &str) -> String {
    slug::slugify(name)
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// ## Summary
/// Cuts a token to at most `max_length` bytes without leaving a trailing
/// hyphen. Tokens are ASCII after normalization; a custom normalizer that
/// emits multi-byte text is cut on the nearest char boundary below the limit.
#[must_use]
pub fn truncate_token(token: &str, max_length: usize) -> String {
    if token.len() <= max_length {
        return token.to_string();
    }
    let mut end = max_length;
    while !token.is_char_boundary(end) {
        end -= 1;
    }
    token[..end].trim_end_matches('-').to_string()
}

/// Anchored pattern matching a token and its numbered variants.
#[derive(Debug, Clone)]
pub struct SlugPattern {
    token: String,
    regex: Regex,
}

impl SlugPattern {
    /// ## Summary
    /// Builds `^<token>(?:-([0-9]+))?$` with the token escaped.
    ///
    /// The pattern text is also valid `PostgreSQL` ARE syntax so stores can push
    /// the match down into their query.
    ///
    /// ## Errors
    /// Returns `InvalidPattern` if the regex fails to compile (only possible for
    /// pathologically long tokens).
    pub fn new(token: &str) -> CoreResult<Self> {
        let source = format!("^{}(?:-([0-9]+))?$", regex::escape(token));
        Ok(Self {
            token: token.to_string(),
            regex: Regex::new(&source)?,
        })
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// ## Summary
    /// Returns the numeric suffix of a matching value.
    ///
    /// - `None`: the value does not match the pattern
    /// - `Some(None)`: the value is the bare token
    /// - `Some(Some(n))`: the value is `token-n`
    #[must_use]
    pub fn suffix_of(&self, value: &str) -> Option<Option<u64>> {
        let captures = self.regex.captures(value)?;
        // Digit runs too long for u64 saturate; they still sort last.
        Some(
            captures
                .get(1)
                .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX)),
        )
    }
}
