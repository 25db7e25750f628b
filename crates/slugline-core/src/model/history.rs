//! Ordered slug history of a document.

use serde::{Deserialize, Serialize};

/// Every slug ever assigned to a document, oldest first.
///
/// The last element is the current slug; an empty history means no slug has
/// been assigned. A value appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlugHistory(Vec<String>);

impl SlugHistory {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// ## Summary
    /// Records `token` as the current slug.
    ///
    /// Any earlier occurrence of `token` is removed first. With `keep_history`
    /// the token is appended so older values keep resolving; without it the
    /// history is replaced by the single token.
    pub fn record(&mut self, token: &str, keep_history: bool) {
        self.0.retain(|value| value != token);
        if !keep_history {
            self.0.clear();
        }
        self.0.push(token.to_string());
    }

    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    /// Removes every listed value, keeping the order of what remains.
    pub fn remove_all(&mut self, values: &[String]) {
        self.0.retain(|value| !values.contains(value));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for SlugHistory {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl<'a> FromIterator<&'a str> for SlugHistory {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}
