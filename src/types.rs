//! The column type registry.
//!
//! `ColumnType` is the closed set of logical column types a schema may declare.
//! Each type knows how to validate an arbitrary JSON value, so schema construction
//! resolves a declared type tag exactly once and validation afterwards is a plain
//! method call. Resolving a tag outside the registry is a hard definition error at
//! construction time, never at query time.

use chrono::{DateTime, NaiveDate};
use serde_json::Value as JsonValue;

/// Logical column types supported by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Boolean,
    Date,
    DoublePrecision,
    Integer,
    Character,
    CharacterVarying,
}

impl ColumnType {
    /// Resolve a textual type tag into a registry entry.
    ///
    /// Tags are the SQL names, including the two-word forms (`"double precision"`,
    /// `"character varying"`). Returns `None` for anything outside the fixed set.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "bigint" => Some(Self::BigInt),
            "boolean" => Some(Self::Boolean),
            "date" => Some(Self::Date),
            "double precision" => Some(Self::DoublePrecision),
            "integer" => Some(Self::Integer),
            "character" => Some(Self::Character),
            "character varying" => Some(Self::CharacterVarying),
            _ => None,
        }
    }

    /// The SQL name of this type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BigInt => "bigint",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DoublePrecision => "double precision",
            Self::Integer => "integer",
            Self::Character => "character",
            Self::CharacterVarying => "character varying",
        }
    }

    /// Validate a JSON value against this type.
    ///
    /// JSON `null` is accepted by no type; nullability is a column property
    /// (field absence), not a type property.
    pub fn accepts(&self, value: &JsonValue) -> bool {
        match self {
            Self::BigInt | Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Date => value.as_str().is_some_and(is_parseable_date),
            // serde_json numbers are finite by construction
            Self::DoublePrecision => value.is_number(),
            Self::Character | Self::CharacterVarying => value.is_string(),
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Check whether a string parses as a calendar date.
///
/// Accepts ISO `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn is_parseable_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
}

/// Parse a date value out of a string, discarding any time-of-day component.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}
