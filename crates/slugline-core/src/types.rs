//! Primary identifier kinds and values.
//!
//! ## Summary
//! Every document type declares one [`IdKind`]. The kind decides how
//! identifiers are generated, how they are written as text, and which
//! caller-supplied strings "look like" an identifier rather than a slug.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identifier kind of a document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    /// RFC 4122 UUID, generated as v7.
    Uuid,
    /// 12-byte object id written as 24 hexadecimal characters.
    ObjectId,
    /// Caller-assigned 64-bit integer.
    Integer,
}

impl IdKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::ObjectId => "object_id",
            Self::Integer => "integer",
        }
    }

    /// Returns `true` for kinds whose values are generated rather than assigned.
    #[must_use]
    pub const fn is_generated(self) -> bool {
        matches!(self, Self::Uuid | Self::ObjectId)
    }

    /// ## Summary
    /// Parses an identifier literal of this kind.
    ///
    /// Accepted formats:
    /// - `Uuid`: anything `uuid::Uuid::try_parse` accepts
    /// - `ObjectId`: exactly 24 ASCII hex characters, either case
    /// - `Integer`: base-10 `i64`, optional leading `-`
    #[must_use]
    pub fn parse(self, value: &str) -> Option<DocumentId> {
        match self {
            Self::Uuid => uuid::Uuid::try_parse(value).ok().map(DocumentId::Uuid),
            Self::ObjectId => value.parse::<ObjectId>().ok().map(DocumentId::ObjectId),
            Self::Integer => parse_integer(value).map(DocumentId::Integer),
        }
    }

    /// Returns `true` if `value` would be read as an identifier of this kind.
    #[must_use]
    pub fn looks_like(self, value: &str) -> bool {
        self.parse(value).is_some()
    }

    /// ## Summary
    /// Generates a fresh identifier.
    ///
    /// Returns `None` for `Integer`, which is always assigned by the caller.
    #[must_use]
    pub fn generate(self) -> Option<DocumentId> {
        match self {
            Self::Uuid => Some(DocumentId::Uuid(uuid::Uuid::now_v7())),
            Self::ObjectId => Some(DocumentId::ObjectId(ObjectId::generate())),
            Self::Integer => None,
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_integer(value: &str) -> Option<i64> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// A 12-byte object identifier: 4 bytes of big-endian unix seconds followed by
/// 8 random bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub const HEX_LEN: usize = 24;

    #[must_use]
    pub fn generate() -> Self {
        let seconds = u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(u32::MAX);
        let random = uuid::Uuid::new_v4();
        let mut bytes = [0_u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..].copy_from_slice(&random.as_bytes()[..8]);
        Self(bytes)
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

impl FromStr for ObjectId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidIdentifier {
            kind: IdKind::ObjectId.as_str(),
            value: s.to_string(),
        };
        if s.len() != Self::HEX_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let mut bytes = [0_u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|_err| invalid())?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for ObjectId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ObjectId> for String {
    fn from(value: ObjectId) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Primary identifier of a document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DocumentId {
    Uuid(uuid::Uuid),
    ObjectId(ObjectId),
    Integer(i64),
}

impl DocumentId {
    #[must_use]
    pub const fn kind(&self) -> IdKind {
        match self {
            Self::Uuid(_) => IdKind::Uuid,
            Self::ObjectId(_) => IdKind::ObjectId,
            Self::Integer(_) => IdKind::Integer,
        }
    }

    /// ## Summary
    /// Parses the canonical text form of an identifier of the given kind.
    ///
    /// ## Errors
    /// Returns `InvalidIdentifier` if `value` is not a literal of `kind`.
    pub fn parse(kind: IdKind, value: &str) -> Result<Self, CoreError> {
        kind.parse(value).ok_or_else(|| CoreError::InvalidIdentifier {
            kind: kind.as_str(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(id) => write!(f, "{}", id.hyphenated()),
            Self::ObjectId(id) => write!(f, "{id}"),
            Self::Integer(id) => write!(f, "{id}"),
        }
    }
}

impl From<uuid::Uuid> for DocumentId {
    fn from(value: uuid::Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<ObjectId> for DocumentId {
    fn from(value: ObjectId) -> Self {
        Self::ObjectId(value)
    }
}

impl From<i64> for DocumentId {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}
