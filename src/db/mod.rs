//! Database abstraction layer.
//!
//! This module provides the capability surface the rest of the crate consumes:
//! - `query(sql, params)` returning a [`QueryOutcome`]
//! - `acquire_client()` returning a dedicated client for transactional work
//! - `end()` for teardown
//!
//! [`Database`] dispatches over concrete backends: the live sqlx Postgres driver
//! and an in-memory scripted stub for tests. Dispatch is a plain enum match, so
//! adding a backend means adding a variant and its arms.

pub mod params;
pub mod postgres;
pub mod stub;
pub mod transaction;
pub mod types;

pub use params::SqlParam;
pub use postgres::{PgClient, PostgresDatabase};
pub use stub::{RecordedStatement, StubClient, StubDatabase};
pub use transaction::{TransactionAction, TransactionOutcome, perform_transaction};

use crate::Record;
use crate::error::DbResult;

/// Result of executing one SQL statement.
///
/// `row_count` mirrors what the underlying driver reports: the number of data rows
/// for a read, the number of affected rows for a write, or `None` when the driver
/// gave no indicator at all. Callers that branch on emptiness must treat `None`
/// like zero.
#[derive(Debug, Clone, Default)]
pub struct QueryOutcome {
    pub row_count: Option<u64>,
    pub rows: Vec<Record>,
}

impl QueryOutcome {
    /// An outcome with no rows and no row-count indicator.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An outcome carrying data rows; the row count is their number.
    pub fn with_rows(rows: Vec<Record>) -> Self {
        Self {
            row_count: Some(rows.len() as u64),
            rows,
        }
    }

    /// An outcome for a write that affected `count` rows.
    pub fn with_rows_affected(count: u64) -> Self {
        Self {
            row_count: Some(count),
            rows: Vec::new(),
        }
    }

    /// Whether the outcome reports at least one row.
    pub fn has_rows(&self) -> bool {
        self.row_count.unwrap_or(0) > 0
    }
}

/// A database handle shared by every table bound to it.
#[derive(Debug, Clone)]
pub enum Database {
    /// Live PostgreSQL connection pool.
    Postgres(PostgresDatabase),
    /// Scripted in-memory test double.
    Stub(StubDatabase),
}

impl Database {
    /// Execute one parameterized statement.
    pub async fn query(&self, sql: &str, params: &[SqlParam]) -> DbResult<QueryOutcome> {
        match self {
            Database::Postgres(db) => db.query(sql, params).await,
            Database::Stub(db) => db.query(sql, params).await,
        }
    }

    /// Acquire a dedicated client for a transactional statement sequence.
    pub async fn acquire_client(&self) -> DbResult<DbClient> {
        match self {
            Database::Postgres(db) => db.acquire_client().await.map(DbClient::Postgres),
            Database::Stub(db) => db.acquire_client().await.map(DbClient::Stub),
        }
    }

    /// Tear the backend down. Idempotent.
    pub async fn end(&self) {
        match self {
            Database::Postgres(db) => db.end().await,
            Database::Stub(db) => db.end().await,
        }
    }
}

/// A dedicated client holding one underlying connection exclusively.
///
/// Statements issued through the same client share session state, which is what
/// makes BEGIN/COMMIT sequencing meaningful. The connection is returned to its
/// pool when the client is dropped, on every exit path.
pub enum DbClient {
    Postgres(PgClient),
    Stub(StubClient),
}

impl DbClient {
    /// Execute one parameterized statement on this client's connection.
    pub async fn query(&mut self, sql: &str, params: &[SqlParam]) -> DbResult<QueryOutcome> {
        match self {
            DbClient::Postgres(client) => client.query(sql, params).await,
            DbClient::Stub(client) => client.query(sql, params).await,
        }
    }
}
