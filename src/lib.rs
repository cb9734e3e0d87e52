//! # tablemap
//!
//! Schema-driven table mapping, transactional batches and test fixtures for
//! PostgreSQL.
//!
//! A table is declared as a mapping from external (camelCase) field names to
//! column types; the crate validates records against that schema, serializes
//! them into parameterized multi-row INSERT statements, renames result-row
//! fields back to the external shape, runs ordered SQL batches atomically with
//! rollback-on-failure, and generates randomized schema-conformant records for
//! test setup.
//!
//! ```no_run
//! use serde_json::json;
//! use tablemap::{ConnectConfig, ModelRegistry};
//!
//! # async fn demo() -> tablemap::DbResult<()> {
//! let registry = ModelRegistry::new();
//! let games = registry
//!     .create_model(
//!         "games",
//!         &json!({
//!             "title": "character varying (100)",
//!             "homeId": "bigint",
//!             "playedOn": {"type": "date", "allowNull": true},
//!         }),
//!     )
//!     .await?;
//!
//! registry.connect(&ConnectConfig::from_env()?).await?;
//!
//! let record = json!({"title": "Opening Night", "homeId": 7});
//! games.insert(record.as_object().unwrap()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod fixtures;
pub mod naming;
pub mod registry;
pub mod schema;
pub mod table;
pub mod types;

pub use config::ConnectConfig;
pub use db::{
    Database, DbClient, PostgresDatabase, QueryOutcome, SqlParam, StubDatabase,
    TransactionAction, TransactionOutcome, perform_transaction,
};
pub use error::{DbError, DbResult};
pub use fixtures::TestFixture;
pub use registry::ModelRegistry;
pub use schema::{Column, Schema};
pub use table::Table;
pub use types::ColumnType;

/// A record in either the external or the storage shape: an ordered map from
/// field name to JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;
