//! The table engine.
//!
//! A [`Table`] binds a [`Schema`] to a shared database handle and provides the
//! record-level operations: validation against column types, serialization into
//! parameterized multi-row INSERT statements, passthrough queries, and the
//! storage-to-external rename of result rows.
//!
//! Tables are created before any connection exists and hold the handle behind a
//! lock so it can be attached (and replaced) later; operations without a bound
//! handle fail fast with a precondition error.

use crate::Record;
use crate::db::params::SqlParam;
use crate::db::{Database, QueryOutcome};
use crate::error::{DbError, DbResult};
use crate::schema::{Column, Schema};
use crate::types::{ColumnType, parse_date};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

/// A schema bound to a (re)attachable database handle.
#[derive(Debug)]
pub struct Table {
    schema: Schema,
    db: RwLock<Option<Arc<Database>>>,
}

impl Table {
    /// Create a table from its name and a schema declaration mapping.
    ///
    /// Fails with a definition error for any invalid declaration; see
    /// [`Schema::new`]. The table starts unbound.
    pub fn new(name: impl Into<String>, definition: &JsonValue) -> DbResult<Self> {
        Ok(Self {
            schema: Schema::new(name, definition)?,
            db: RwLock::new(None),
        })
    }

    /// The table name.
    pub fn name(&self) -> &str {
        self.schema.table_name()
    }

    /// The bound schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Attach (or replace) the shared database handle.
    pub async fn bind_database(&self, db: Arc<Database>) {
        *self.db.write().await = Some(db);
    }

    /// Detach the database handle; subsequent operations fail fast.
    pub async fn unbind_database(&self) {
        *self.db.write().await = None;
    }

    /// Whether a database handle is currently attached.
    pub async fn is_bound(&self) -> bool {
        self.db.read().await.is_some()
    }

    async fn database(&self) -> DbResult<Arc<Database>> {
        self.db.read().await.clone().ok_or_else(|| {
            DbError::precondition("Database needs to be connected before running a query")
        })
    }

    /// Validate a record against the schema.
    ///
    /// A record is valid when, for every column, the field is either absent with
    /// `allowNull` set, or present with a value its type accepts. An explicit
    /// JSON `null` counts as present and no type accepts it. Evaluation stops at
    /// the first failing column.
    pub fn validate(&self, record: &Record) -> bool {
        self.schema.columns().iter().all(|column| {
            match record.get(&column.external_name) {
                None => column.allow_null,
                Some(value) => column.accepts(value),
            }
        })
    }

    /// Insert one record.
    pub async fn insert(&self, record: &Record) -> DbResult<QueryOutcome> {
        self.insert_many(std::slice::from_ref(record)).await
    }

    /// Insert a batch of records with a single multi-row INSERT.
    ///
    /// The column list is every storage name in schema order; each record
    /// contributes one placeholder group, numbered consecutively across the whole
    /// statement (`($1, $2), ($3, $4)`, …), with values flattened in the same
    /// row-major order. Absent fields bind as NULL; a present value on a `date`
    /// column binds as a SQL date. Execution errors propagate unchanged.
    pub async fn insert_many(&self, records: &[Record]) -> DbResult<QueryOutcome> {
        let (sql, params) = self.build_insert(records)?;
        let db = self.database().await?;

        debug!(table = self.name(), records = records.len(), "Inserting");
        db.query(&sql, &params).await
    }

    fn build_insert(&self, records: &[Record]) -> DbResult<(String, Vec<SqlParam>)> {
        if records.is_empty() {
            return Err(DbError::precondition(
                "Insert requires at least one record",
            ));
        }

        let columns = self.schema.columns();

        let fields = columns
            .iter()
            .map(|c| c.storage_name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let groups = (0..records.len())
            .map(|offset| format!("({})", placeholder_group(offset, columns.len())))
            .collect::<Vec<_>>()
            .join(", ");

        let params = records
            .iter()
            .flat_map(|record| {
                columns
                    .iter()
                    .map(|column| param_for_column(column, record.get(&column.external_name)))
            })
            .collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.name(),
            fields,
            groups
        );

        Ok((sql, params))
    }

    /// Rename a result row's storage-named fields to their external names.
    ///
    /// Fields without a matching column pass through under their original name,
    /// so rows from joins or expressions survive untouched. Field order is
    /// preserved.
    pub fn transform(&self, row: Record) -> Record {
        row.into_iter()
            .map(|(key, value)| {
                match self.schema.column_by_storage_name(&key) {
                    Some(column) => (column.external_name.clone(), value),
                    None => (key, value),
                }
            })
            .collect()
    }

    /// [`Self::transform`] applied per row, preserving row order.
    pub fn transform_many(&self, rows: Vec<Record>) -> Vec<Record> {
        rows.into_iter().map(|row| self.transform(row)).collect()
    }

    /// Execute arbitrary SQL through the bound handle.
    pub async fn query(&self, sql: &str, params: &[SqlParam]) -> DbResult<QueryOutcome> {
        let db = self.database().await?;
        db.query(sql, params).await
    }

    /// Execute a query and return only the first row, transformed.
    ///
    /// Returns `None` when the result reports zero rows or carries no row-count
    /// indicator at all. An execution error is logged and also resolves to
    /// `None`: by this API's contract, "not found" and "query failed" are
    /// indistinguishable. Callers that need the difference must use
    /// [`Self::query`].
    pub async fn query_for_one(&self, sql: &str, params: &[SqlParam]) -> Option<Record> {
        match self.query(sql, params).await {
            Ok(outcome) if outcome.has_rows() => {
                outcome.rows.into_iter().next().map(|row| self.transform(row))
            }
            Ok(_) => None,
            Err(err) => {
                error!(table = self.name(), error = %err, "Query failed");
                None
            }
        }
    }

    /// Execute a query and return every row, transformed, in result order.
    ///
    /// Same zero-row and error-swallowing contract as [`Self::query_for_one`].
    pub async fn query_for_many(&self, sql: &str, params: &[SqlParam]) -> Option<Vec<Record>> {
        match self.query(sql, params).await {
            Ok(outcome) if outcome.has_rows() => Some(self.transform_many(outcome.rows)),
            Ok(_) => None,
            Err(err) => {
                error!(table = self.name(), error = %err, "Query failed");
                None
            }
        }
    }
}

/// Placeholders for one record: `$n, $n+1, …`, offset by the records before it.
fn placeholder_group(offset: usize, width: usize) -> String {
    let start = offset * width + 1;
    (0..width)
        .map(|i| format!("${}", start + i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn param_for_column(column: &Column, value: Option<&JsonValue>) -> SqlParam {
    let Some(value) = value else {
        return SqlParam::Null;
    };

    if column.column_type == ColumnType::Date {
        if let Some(date) = value.as_str().and_then(parse_date) {
            return SqlParam::Date(date);
        }
    }

    SqlParam::from_json(value)
}
