//! Scripted in-memory test double for the database surface.
//!
//! [`StubDatabase`] implements the same query/acquire-client capability as the
//! live backend without any I/O. Tests script it with a FIFO queue of outcomes
//! (one entry consumed per statement, in order; an empty queue answers with an
//! empty outcome) and inspect the statements it recorded afterwards. Clients
//! acquired from a stub share its script and its statement log.

use crate::db::params::SqlParam;
use crate::db::QueryOutcome;
use crate::error::{DbError, DbResult};
use crate::Record;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One statement as the stub received it.
#[derive(Debug, Clone)]
pub struct RecordedStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

#[derive(Debug, Default)]
struct StubState {
    statements: Mutex<Vec<RecordedStatement>>,
    script: Mutex<VecDeque<DbResult<QueryOutcome>>>,
}

/// Scripted stand-in for a live database.
#[derive(Debug, Clone, Default)]
pub struct StubDatabase {
    state: Arc<StubState>,
}

impl StubDatabase {
    /// Create a stub that answers every statement with an empty outcome.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome for the next unanswered statement.
    pub async fn push_outcome(&self, outcome: QueryOutcome) {
        self.state.script.lock().await.push_back(Ok(outcome));
    }

    /// Queue data rows for the next unanswered statement.
    pub async fn push_rows(&self, rows: Vec<Record>) {
        self.push_outcome(QueryOutcome::with_rows(rows)).await;
    }

    /// Queue an error for the next unanswered statement.
    pub async fn push_error(&self, err: DbError) {
        self.state.script.lock().await.push_back(Err(err));
    }

    /// Every statement executed so far, in execution order.
    pub async fn statements(&self) -> Vec<RecordedStatement> {
        self.state.statements.lock().await.clone()
    }

    /// The SQL text of every statement executed so far.
    pub async fn statement_sql(&self) -> Vec<String> {
        self.state
            .statements
            .lock()
            .await
            .iter()
            .map(|s| s.sql.clone())
            .collect()
    }

    /// Execute one statement: record it, then answer from the script.
    pub async fn query(&self, sql: &str, params: &[SqlParam]) -> DbResult<QueryOutcome> {
        self.state.statements.lock().await.push(RecordedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        match self.state.script.lock().await.pop_front() {
            Some(result) => result,
            None => Ok(QueryOutcome::empty()),
        }
    }

    /// Acquire a client sharing this stub's script and log.
    pub async fn acquire_client(&self) -> DbResult<StubClient> {
        Ok(StubClient {
            db: self.clone(),
        })
    }

    /// Teardown is a no-op for the stub.
    pub async fn end(&self) {}
}

/// Client handle over a [`StubDatabase`].
pub struct StubClient {
    db: StubDatabase,
}

impl StubClient {
    /// Execute one statement through the parent stub.
    pub async fn query(&mut self, sql: &str, params: &[SqlParam]) -> DbResult<QueryOutcome> {
        self.db.query(sql, params).await
    }
}
