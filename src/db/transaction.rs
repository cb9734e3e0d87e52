//! Transactional execution of an ordered batch of SQL actions.
//!
//! The executor acquires one dedicated client, issues `BEGIN`, runs every action
//! strictly in sequence (later statements may depend on earlier side effects, and
//! the session carries the transaction state), then `COMMIT`. Any statement
//! failure triggers `ROLLBACK` on the same client and resolves the call to the
//! [`TransactionOutcome::RolledBack`] sentinel instead of an error, so callers
//! branch on the outcome rather than catching. The client is a pooled connection
//! returned on drop, so it is released on every exit path.

use crate::db::params::SqlParam;
use crate::db::{Database, DbClient, QueryOutcome};
use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// One statement in a transactional batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionAction {
    pub sql: String,
    #[serde(default)]
    pub params: Vec<SqlParam>,
}

impl TransactionAction {
    /// Create an action from a statement and its parameters.
    pub fn new(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// How a transactional batch ended.
///
/// `RolledBack` is a sentinel, not an error: a statement failed and the
/// transaction was rolled back cleanly, and what that means is the caller's
/// decision. `Err` on the overall call is reserved for failures before any
/// statement ran (validation, client acquisition).
#[derive(Debug)]
pub enum TransactionOutcome {
    /// All actions ran; carries the commit's outcome.
    Committed(QueryOutcome),
    /// A statement failed and the batch was rolled back.
    RolledBack,
}

impl TransactionOutcome {
    /// Whether the batch committed.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

/// Run an ordered batch of actions inside a single database transaction.
///
/// Validates the batch before acquiring any resource: an action with empty SQL
/// fails the whole call with a precondition error and nothing reaches the
/// database.
pub async fn perform_transaction(
    db: &Database,
    actions: &[TransactionAction],
) -> DbResult<TransactionOutcome> {
    if actions.iter().any(|action| action.sql.trim().is_empty()) {
        return Err(DbError::precondition(
            "Transaction actions require a sql statement and a params list",
        ));
    }

    let mut client = db.acquire_client().await?;

    match run_actions(&mut client, actions).await {
        Ok(commit) => {
            debug!(actions = actions.len(), "Transaction committed");
            Ok(TransactionOutcome::Committed(commit))
        }
        Err(err) => {
            warn!(error = %err, "Transaction failed, rolling back");
            if let Err(rollback_err) = client.query("ROLLBACK", &[]).await {
                error!(error = %rollback_err, "Rollback failed");
            }
            Ok(TransactionOutcome::RolledBack)
        }
    }
    // client drops here on both paths, returning its connection to the pool
}

async fn run_actions(
    client: &mut DbClient,
    actions: &[TransactionAction],
) -> DbResult<QueryOutcome> {
    client.query("BEGIN", &[]).await?;

    for action in actions {
        client.query(&action.sql, &action.params).await?;
    }

    client.query("COMMIT", &[]).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StubDatabase;

    fn insert_action(n: i64) -> TransactionAction {
        TransactionAction::new(
            "INSERT INTO games (home_id) VALUES ($1)",
            vec![SqlParam::Int(n)],
        )
    }

    #[tokio::test]
    async fn test_commit_path_sequencing() {
        let stub = StubDatabase::new();
        let db = Database::Stub(stub.clone());

        let outcome = perform_transaction(&db, &[insert_action(1), insert_action(2)])
            .await
            .unwrap();

        assert!(outcome.is_committed());
        assert_eq!(
            stub.statement_sql().await,
            vec![
                "BEGIN",
                "INSERT INTO games (home_id) VALUES ($1)",
                "INSERT INTO games (home_id) VALUES ($1)",
                "COMMIT",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_action_rolls_back() {
        let stub = StubDatabase::new();
        stub.push_outcome(QueryOutcome::empty()).await; // BEGIN
        stub.push_outcome(QueryOutcome::with_rows_affected(1)).await; // first insert
        stub.push_error(DbError::database(
            "duplicate key value violates unique constraint",
            Some("23505".to_string()),
        ))
        .await; // second insert

        let db = Database::Stub(stub.clone());
        let outcome = perform_transaction(&db, &[insert_action(1), insert_action(1)])
            .await
            .unwrap();

        assert!(!outcome.is_committed());
        let sql = stub.statement_sql().await;
        assert_eq!(sql.first().map(String::as_str), Some("BEGIN"));
        assert_eq!(sql.last().map(String::as_str), Some("ROLLBACK"));
        assert!(!sql.contains(&"COMMIT".to_string()));
    }

    #[tokio::test]
    async fn test_empty_sql_fails_before_acquiring() {
        let stub = StubDatabase::new();
        let db = Database::Stub(stub.clone());

        let err = perform_transaction(&db, &[TransactionAction::new("  ", vec![])])
            .await
            .unwrap_err();

        assert!(err.is_precondition());
        assert!(stub.statements().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_commits() {
        let db = Database::Stub(StubDatabase::new());
        let outcome = perform_transaction(&db, &[]).await.unwrap();
        assert!(outcome.is_committed());
    }
}
