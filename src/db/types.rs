//! Postgres-to-JSON type mappings.
//!
//! Result rows come back from sqlx as driver-typed values; the rest of the crate
//! works on `serde_json` maps. Conversion is two-phase:
//! 1. [`TypeCategory`] classifies the column's declared type into a logical category
//! 2. a category-specific decoder extracts the value
//!
//! Date columns decode to ISO `YYYY-MM-DD` strings, so a record inserted from a
//! date string compares equal after a round trip.

use crate::Record;
use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Boolean,
    Date,
    Text,
    Unknown,
}

/// Classify a Postgres type name into a logical category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Integer types (int2/int4/int8, serial variants)
    if lower.contains("int") || lower.contains("serial") {
        return TypeCategory::Integer;
    }

    // Boolean
    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    // Float types
    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    // Calendar dates; timestamps stay in the text path
    if lower == "date" {
        return TypeCategory::Date;
    }

    // Character types
    if lower.contains("char") || lower == "text" || lower == "name" {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

/// Convert a database row to a JSON map keyed by storage column names.
pub trait RowToJson {
    fn to_json_map(&self) -> Record;
}

impl RowToJson for PgRow {
    fn to_json_map(&self) -> Record {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name());
                let value = decode_column(self, idx, category);
                (col.name().to_string(), value)
            })
            .collect()
    }
}

fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> JsonValue {
    match category {
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::Boolean => decode_boolean(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Date => decode_date(row, idx),
        _ => decode_text(row, idx),
    }
}

fn decode_integer(row: &PgRow, idx: usize) -> JsonValue {
    if let Ok(None) = row.try_get::<Option<i64>, _>(idx) {
        return JsonValue::Null;
    }
    if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return JsonValue::Number(v.into());
    }
    JsonValue::Null
}

fn decode_boolean(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<bool>, _>(idx)
        .ok()
        .flatten()
        .map(JsonValue::Bool)
        .unwrap_or(JsonValue::Null)
}

fn decode_float(row: &PgRow, idx: usize) -> JsonValue {
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
        return serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
        return serde_json::Number::from_f64(v as f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string()));
    }
    JsonValue::Null
}

fn decode_date(row: &PgRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<NaiveDate>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.format("%Y-%m-%d").to_string()),
        Ok(None) => JsonValue::Null,
        Err(e) => {
            tracing::error!("Failed to decode date column: {:?}", e);
            JsonValue::Null
        }
    }
}

fn decode_text(row: &PgRow, idx: usize) -> JsonValue {
    row.try_get::<Option<String>, _>(idx)
        .ok()
        .flatten()
        .map(JsonValue::String)
        .unwrap_or(JsonValue::Null)
}
