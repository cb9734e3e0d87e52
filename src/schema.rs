//! Schema and column model.
//!
//! A [`Schema`] is built once from a declaration mapping and is immutable after
//! construction. Each external field name maps to either a bare type string
//! (`"character varying (45)"`) or a descriptor object
//! (`{"type": "bigint", "column": "home_id", "allowNull": true}`). Construction is
//! all-or-nothing: any invalid entry fails the whole schema with a definition error.

use crate::error::{DbError, DbResult};
use crate::naming::to_snake_case;
use crate::types::ColumnType;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Metadata for one declared column.
#[derive(Debug, Clone)]
pub struct Column {
    /// Field name in the external (camelCase) record shape.
    pub external_name: String,
    /// Column name in the database, snake_case unless explicitly overridden.
    pub storage_name: String,
    /// Resolved registry type.
    pub column_type: ColumnType,
    /// Declared size, from a parenthesized suffix on the type string.
    pub size: Option<u32>,
    /// Whether the field may be absent from a record.
    pub allow_null: bool,
}

impl Column {
    /// Validate a JSON value against this column's type.
    pub fn accepts(&self, value: &JsonValue) -> bool {
        self.column_type.accepts(value)
    }
}

/// Object form of a column declaration.
#[derive(Debug, Deserialize)]
struct ColumnDescriptor {
    /// Type tag; required. Carried as an Option so its absence is reported as a
    /// definition error instead of a serde error.
    #[serde(rename = "type")]
    type_tag: Option<String>,
    /// Explicit storage column name override.
    column: Option<String>,
    #[serde(rename = "allowNull", default)]
    allow_null: bool,
}

/// Ordered column metadata for one logical table.
#[derive(Debug, Clone)]
pub struct Schema {
    table_name: String,
    columns: Vec<Column>,
}

impl Schema {
    /// Build a schema from a declaration mapping.
    ///
    /// Fails with a definition error if the declaration is not a JSON object, if
    /// any entry is neither a type string nor a descriptor object, if a descriptor
    /// omits its `type`, or if any resolved type tag is outside the registry.
    pub fn new(table_name: impl Into<String>, definition: &JsonValue) -> DbResult<Self> {
        let Some(fields) = definition.as_object() else {
            return Err(DbError::definition(
                "A table definition must be a mapping of field names to column declarations",
            ));
        };

        let columns = fields
            .iter()
            .map(|(name, decl)| build_column(name, decl))
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Self {
            table_name: table_name.into(),
            columns,
        })
    }

    /// The table this schema describes.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by its storage (database) name.
    pub fn column_by_storage_name(&self, storage_name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.storage_name == storage_name)
    }

    /// Look up a column by its external (record) name.
    pub fn column_by_external_name(&self, external_name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.external_name == external_name)
    }
}

fn build_column(name: &str, decl: &JsonValue) -> DbResult<Column> {
    let (declared_type, storage_name, allow_null) = match decl {
        JsonValue::String(type_tag) => (type_tag.clone(), to_snake_case(name), false),
        JsonValue::Object(_) => {
            let descriptor: ColumnDescriptor = serde_json::from_value(decl.clone())
                .map_err(|e| DbError::definition(format!("Invalid column descriptor: {}", e)))?;

            let Some(type_tag) = descriptor.type_tag else {
                return Err(DbError::definition(
                    "A type property is required when using an object to define a database column",
                ));
            };

            let storage_name = descriptor.column.unwrap_or_else(|| to_snake_case(name));
            (type_tag, storage_name, descriptor.allow_null)
        }
        _ => {
            return Err(DbError::definition(
                "A column must be defined with a string or with an object",
            ));
        }
    };

    let (type_tag, size) = split_declared_size(&declared_type);

    let column_type = ColumnType::parse(&type_tag)
        .ok_or_else(|| DbError::definition(format!("{} is not a valid column type", type_tag)))?;

    Ok(Column {
        external_name: name.to_string(),
        storage_name,
        column_type,
        size,
        allow_null,
    })
}

/// Split a parenthesized numeric suffix off a declared type string.
///
/// `"character (45)"` and `"character(45)"` both yield `("character", Some(45))`.
/// Without a well-formed suffix the string is returned untouched (and will then be
/// rejected by the registry lookup if it is not a bare type tag).
fn split_declared_size(declared: &str) -> (String, Option<u32>) {
    let Some(open) = declared.find('(') else {
        return (declared.trim().to_string(), None);
    };

    let rest = &declared[open + 1..];
    let Some(close) = rest.find(')') else {
        return (declared.trim().to_string(), None);
    };

    let digits = &rest[..close];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return (declared.trim().to_string(), None);
    }

    match digits.parse::<u32>() {
        Ok(size) => (declared[..open].trim().to_string(), Some(size)),
        Err(_) => (declared.trim().to_string(), None),
    }
}
