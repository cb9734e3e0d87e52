//! End-to-end tests against the scripted stub backend.
//!
//! These cover the paths that need a database-shaped collaborator without a live
//! server: statement shapes reaching the backend, the null-on-empty and
//! null-on-error query contracts, transaction sequencing, and fixture
//! persistence helpers.

use serde_json::json;
use tablemap::{
    Database, DbError, ModelRegistry, QueryOutcome, Record, SqlParam, StubDatabase,
    TransactionAction,
};

fn record(value: serde_json::Value) -> Record {
    value.as_object().expect("record literal").clone()
}

async fn games_registry() -> (ModelRegistry, StubDatabase) {
    let registry = ModelRegistry::new();
    registry
        .create_model(
            "games",
            &json!({
                "title": "character varying",
                "homeId": "bigint",
            }),
        )
        .await
        .unwrap();

    let stub = StubDatabase::new();
    registry.rebind(Database::Stub(stub.clone())).await;
    (registry, stub)
}

#[tokio::test]
async fn insert_sends_multi_row_statement() {
    let (registry, stub) = games_registry().await;
    let games = registry.get("games").await.unwrap();

    games
        .insert_many(&[
            record(json!({"title": "a", "homeId": 1})),
            record(json!({"title": "b", "homeId": 2})),
        ])
        .await
        .unwrap();

    let statements = stub.statements().await;
    assert_eq!(statements.len(), 1);
    assert_eq!(
        statements[0].sql,
        "INSERT INTO games (title, home_id) VALUES ($1, $2), ($3, $4)"
    );
    assert_eq!(
        statements[0].params,
        vec![
            SqlParam::String("a".to_string()),
            SqlParam::Int(1),
            SqlParam::String("b".to_string()),
            SqlParam::Int(2),
        ]
    );
}

#[tokio::test]
async fn query_for_one_transforms_the_first_row() {
    let (registry, stub) = games_registry().await;
    let games = registry.get("games").await.unwrap();

    stub.push_rows(vec![
        record(json!({"title": "Test Title", "home_id": 2})),
        record(json!({"title": "Other", "home_id": 3})),
    ])
    .await;

    let found = games
        .query_for_one("SELECT * FROM games", &[])
        .await
        .unwrap();

    assert_eq!(
        serde_json::Value::Object(found),
        json!({"title": "Test Title", "homeId": 2})
    );
}

#[tokio::test]
async fn query_for_one_is_none_on_empty_results() {
    let (registry, stub) = games_registry().await;
    let games = registry.get("games").await.unwrap();

    // Zero rows reported.
    stub.push_outcome(QueryOutcome::with_rows(vec![])).await;
    assert!(games.query_for_one("SELECT 1", &[]).await.is_none());

    // No row-count indicator at all.
    stub.push_outcome(QueryOutcome::empty()).await;
    assert!(games.query_for_one("SELECT 1", &[]).await.is_none());
}

#[tokio::test]
async fn query_for_one_swallows_execution_errors() {
    let (registry, stub) = games_registry().await;
    let games = registry.get("games").await.unwrap();

    stub.push_error(DbError::database("relation does not exist", Some("42P01".into())))
        .await;

    assert!(games.query_for_one("SELECT nope", &[]).await.is_none());
}

#[tokio::test]
async fn query_for_many_preserves_row_order() {
    let (registry, stub) = games_registry().await;
    let games = registry.get("games").await.unwrap();

    stub.push_rows(vec![
        record(json!({"home_id": 1})),
        record(json!({"home_id": 2})),
        record(json!({"home_id": 3})),
    ])
    .await;

    let rows = games
        .query_for_many("SELECT * FROM games", &[])
        .await
        .unwrap();

    let ids: Vec<i64> = rows.iter().map(|r| r["homeId"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn transaction_commits_through_the_registry() {
    let (registry, stub) = games_registry().await;

    let actions = vec![
        TransactionAction::new(
            "INSERT INTO games (home_id) VALUES ($1)",
            vec![SqlParam::Int(1)],
        ),
        TransactionAction::new(
            "INSERT INTO games (home_id) VALUES ($1)",
            vec![SqlParam::Int(2)],
        ),
    ];

    let outcome = registry.perform_transaction(&actions).await.unwrap();
    assert!(outcome.is_committed());

    let sql = stub.statement_sql().await;
    assert_eq!(sql.first().map(String::as_str), Some("BEGIN"));
    assert_eq!(sql.last().map(String::as_str), Some("COMMIT"));
    assert_eq!(sql.len(), 4);
}

#[tokio::test]
async fn transaction_requires_a_connection() {
    let registry = ModelRegistry::new();
    let err = registry
        .perform_transaction(&[TransactionAction::new("SELECT 1", vec![])])
        .await
        .unwrap_err();
    assert!(err.is_precondition());
}

#[tokio::test]
async fn fixtures_persist_through_the_bound_table() {
    let (registry, stub) = games_registry().await;
    let fixture = registry.fixture("games").await.unwrap();

    let overrides = record(json!({"homeId": 99}));
    let saved = fixture.generate_and_save_many(2, &overrides).await.unwrap();

    assert_eq!(saved.len(), 2);
    for rec in &saved {
        assert_eq!(rec["homeId"], json!(99));
        assert!(rec["title"].is_string());
    }

    let statements = stub.statements().await;
    assert_eq!(statements.len(), 1);
    assert!(
        statements[0]
            .sql
            .starts_with("INSERT INTO games (title, home_id) VALUES ($1, $2), ($3, $4)")
    );
}

#[tokio::test]
async fn fixture_removals_build_scoped_deletes() {
    let (registry, stub) = games_registry().await;
    let fixture = registry.fixture("games").await.unwrap();

    fixture
        .remove_one("home_id", SqlParam::Int(7))
        .await
        .unwrap();
    fixture
        .remove_many(
            "home_id",
            vec![SqlParam::Int(1), SqlParam::Int(2), SqlParam::Int(3)],
        )
        .await
        .unwrap();
    fixture.remove_all().await.unwrap();

    let sql = stub.statement_sql().await;
    assert_eq!(
        sql,
        vec![
            "DELETE FROM games WHERE home_id = $1",
            "DELETE FROM games WHERE home_id in ($1, $2, $3)",
            "DELETE FROM games",
        ]
    );
}

#[tokio::test]
async fn close_makes_tables_fail_fast_again() {
    let (registry, _stub) = games_registry().await;
    let games = registry.get("games").await.unwrap();

    registry.close().await;

    let err = games
        .insert(&record(json!({"title": "a", "homeId": 1})))
        .await
        .unwrap_err();
    assert!(err.is_precondition());
}
