//! Database enum types with Diesel serialization.
//!
//! Each enum implements `ToSql` and `FromSql` for automatic conversion between
//! Rust and `PostgreSQL` text columns guarded by a CHECK constraint.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;

use slugline_core::types::IdKind;

/// Identifier kind of a stored document.
///
/// Maps to `document.id_kind` CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum IdKindColumn {
    Uuid,
    ObjectId,
    Integer,
}

impl ToSql<Text, Pg> for IdKindColumn {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for IdKindColumn {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"uuid" => Ok(Self::Uuid),
            b"object_id" => Ok(Self::ObjectId),
            b"integer" => Ok(Self::Integer),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl IdKindColumn {
    /// Returns the database string representation of this identifier kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::ObjectId => "object_id",
            Self::Integer => "integer",
        }
    }
}

impl From<IdKindColumn> for IdKind {
    fn from(column: IdKindColumn) -> Self {
        match column {
            IdKindColumn::Uuid => Self::Uuid,
            IdKindColumn::ObjectId => Self::ObjectId,
            IdKindColumn::Integer => Self::Integer,
        }
    }
}

impl From<IdKind> for IdKindColumn {
    fn from(kind: IdKind) -> Self {
        match kind {
            IdKind::Uuid => Self::Uuid,
            IdKind::ObjectId => Self::ObjectId,
            IdKind::Integer => Self::Integer,
        }
    }
}

impl fmt::Display for IdKindColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
