//! The live PostgreSQL backend.
//!
//! [`PostgresDatabase`] wraps a sqlx connection pool. Plain queries run against
//! the pool (any idle connection); transactional work acquires a [`PgClient`],
//! which holds one pooled connection exclusively until dropped.

use crate::config::ConnectConfig;
use crate::db::QueryOutcome;
use crate::db::params::{SqlParam, bind_param};
use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use futures_util::StreamExt;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Either, Postgres};
use tracing::{debug, info};

/// Shared handle to a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    /// Connect to PostgreSQL and verify the pool can hand out a connection.
    ///
    /// Pool construction alone does not touch the network, so a connection is
    /// acquired and released up front; callers that reach this function's `Ok`
    /// can rely on the database actually being reachable.
    pub async fn connect(config: &ConnectConfig) -> DbResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections_or_default())
            .min_connections(config.min_connections_or_default())
            .acquire_timeout(config.acquire_timeout_or_default())
            .idle_timeout(config.idle_timeout_or_default())
            .connect(config.url())
            .await
            .map_err(DbError::from)?;

        let conn = pool.acquire().await.map_err(DbError::from)?;
        drop(conn);

        info!(
            max_connections = config.max_connections_or_default(),
            "Connected to PostgreSQL"
        );

        Ok(Self { pool })
    }

    /// Execute one parameterized statement against the pool.
    pub async fn query(&self, sql: &str, params: &[SqlParam]) -> DbResult<QueryOutcome> {
        run_statement(&self.pool, sql, params).await
    }

    /// Acquire a dedicated client holding one connection exclusively.
    pub async fn acquire_client(&self) -> DbResult<PgClient> {
        let conn = self.pool.acquire().await.map_err(DbError::from)?;
        Ok(PgClient { conn })
    }

    /// Close the pool. Idempotent.
    pub async fn end(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }
}

/// One pooled connection held exclusively for a statement sequence.
///
/// Dropping the client returns the connection to the pool, so every exit path
/// releases it without further bookkeeping.
pub struct PgClient {
    conn: sqlx::pool::PoolConnection<Postgres>,
}

impl PgClient {
    /// Execute one parameterized statement on this connection.
    pub async fn query(&mut self, sql: &str, params: &[SqlParam]) -> DbResult<QueryOutcome> {
        run_statement(&mut *self.conn, sql, params).await
    }
}

/// Bind params, run the statement, and drain the result stream.
///
/// `fetch_many` reports data rows and the driver's affected-row count through the
/// same stream, so arbitrary SQL (reads and writes alike) flows through one code
/// path and the outcome always carries whichever row indicator the driver gave.
async fn run_statement<'c, E>(executor: E, sql: &str, params: &[SqlParam]) -> DbResult<QueryOutcome>
where
    E: sqlx::Executor<'c, Database = Postgres>,
{
    debug!(sql = %sql, params = params.len(), "Executing statement");

    let mut query = sqlx::query(sql);
    for param in params {
        query = bind_param(query, param);
    }

    let mut stream = executor.fetch_many(query);
    let mut rows_affected: Option<u64> = None;
    let mut rows = Vec::new();

    while let Some(item) = stream.next().await {
        match item.map_err(DbError::from)? {
            Either::Left(result) => {
                rows_affected = Some(rows_affected.unwrap_or(0) + result.rows_affected());
            }
            Either::Right(row) => rows.push(row.to_json_map()),
        }
    }

    let row_count = if rows.is_empty() {
        rows_affected
    } else {
        Some(rows.len() as u64)
    };

    Ok(QueryOutcome { row_count, rows })
}
