//! Parameter values and positional binding for database queries.
//!
//! [`SqlParam`] is the bindable value type used everywhere a statement takes
//! parameters: inserts, passthrough queries, transaction actions and fixture
//! deletes. Placeholders in statement text are positional and 1-indexed (`$1`,
//! `$2`, …), matching the params slice by position.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::Postgres;
use sqlx::postgres::PgArguments;

/// A parameter value for parameterized queries.
///
/// Serializes untagged, so params written out as JSON look like plain values.
/// Note the asymmetry for dates: a `Date` serializes to its ISO string, which
/// deserializes back as `String` (the string form wins during untagged matching).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Calendar date, bound as a SQL `date`
    Date(NaiveDate),
}

impl SqlParam {
    /// Check if this parameter is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Date(_) => "date",
        }
    }

    /// Convert a JSON value into a bindable parameter.
    ///
    /// Integral numbers become `Int`, other numbers `Float`. Arrays and objects
    /// have no column type in the registry and are bound as their JSON text.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            JsonValue::String(s) => Self::String(s.clone()),
            other => Self::String(other.to_string()),
        }
    }
}

/// Bind a parameter to a PostgreSQL query.
pub(crate) fn bind_param<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    param: &'q SqlParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match param {
        SqlParam::Null => query.bind(None::<String>),
        SqlParam::Bool(v) => query.bind(*v),
        SqlParam::Int(v) => query.bind(*v),
        SqlParam::Float(v) => query.bind(*v),
        SqlParam::String(v) => query.bind(v.as_str()),
        SqlParam::Date(v) => query.bind(*v),
    }
}
