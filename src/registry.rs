//! Model registry and connection lifecycle.
//!
//! [`ModelRegistry`] owns the named tables of one logical database session and
//! the handle they share. It is an explicit object: construct one per process
//! (or per test) and pass it where it is needed. There is no module-level global
//! to leak state between tests.
//!
//! Tables may be declared before or after connecting: `connect`/`rebind` attach
//! the handle to every registered table, and a table declared afterwards is
//! bound immediately on registration.

use crate::config::ConnectConfig;
use crate::db::{
    Database, PostgresDatabase, QueryOutcome, SqlParam, TransactionAction, TransactionOutcome,
    perform_transaction,
};
use crate::error::{DbError, DbResult};
use crate::fixtures::TestFixture;
use crate::table::Table;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Registry of named tables sharing one database handle.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    tables: RwLock<HashMap<String, Arc<Table>>>,
    db: RwLock<Option<Arc<Database>>>,
}

impl ModelRegistry {
    /// Create an empty, unconnected registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table under a unique name.
    ///
    /// Fails with a definition error on a duplicate name or an invalid schema
    /// declaration. If the registry is already connected, the new table is bound
    /// to the live handle immediately.
    pub async fn create_model(
        &self,
        name: &str,
        definition: &JsonValue,
    ) -> DbResult<Arc<Table>> {
        let mut tables = self.tables.write().await;
        if tables.contains_key(name) {
            return Err(DbError::definition(format!(
                "Model {} has already been defined",
                name
            )));
        }

        let table = Arc::new(Table::new(name, definition)?);

        if let Some(db) = self.db.read().await.clone() {
            table.bind_database(db).await;
        }

        tables.insert(name.to_string(), Arc::clone(&table));
        Ok(table)
    }

    /// Look up a registered table.
    pub async fn get(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.read().await.get(name).cloned()
    }

    /// A fixture generator bound to the named table.
    pub async fn fixture(&self, name: &str) -> DbResult<TestFixture> {
        let table = self.get(name).await.ok_or_else(|| {
            DbError::precondition(format!("Model {} is not registered", name))
        })?;
        Ok(TestFixture::new(table))
    }

    /// Remove a table from the registry, detaching its handle.
    ///
    /// Returns the removed table, which stays usable for anyone still holding an
    /// `Arc` to it (though unbound).
    pub async fn deregister(&self, name: &str) -> Option<Arc<Table>> {
        let removed = self.tables.write().await.remove(name);
        if let Some(table) = &removed {
            table.unbind_database().await;
        }
        removed
    }

    /// Connect to PostgreSQL and bind the handle to every registered table.
    ///
    /// Replaces any previously attached handle (without tearing it down; call
    /// [`Self::close`] first if the old pool should be shut down).
    pub async fn connect(&self, config: &ConnectConfig) -> DbResult<()> {
        let db = PostgresDatabase::connect(config).await?;
        self.rebind(Database::Postgres(db)).await;
        Ok(())
    }

    /// Attach an arbitrary database handle to the registry and all its tables.
    pub async fn rebind(&self, db: Database) {
        let db = Arc::new(db);
        *self.db.write().await = Some(Arc::clone(&db));

        let tables = self.tables.read().await;
        for table in tables.values() {
            table.bind_database(Arc::clone(&db)).await;
        }
        info!(tables = tables.len(), "Database handle bound");
    }

    /// Whether a database handle is currently attached.
    pub async fn is_connected(&self) -> bool {
        self.db.read().await.is_some()
    }

    /// Tear down the handle and detach it from every table. Idempotent.
    pub async fn close(&self) {
        let db = self.db.write().await.take();
        if let Some(db) = db {
            db.end().await;
        }

        for table in self.tables.read().await.values() {
            table.unbind_database().await;
        }
    }

    async fn database(&self) -> DbResult<Arc<Database>> {
        self.db.read().await.clone().ok_or_else(|| {
            DbError::precondition("Database needs to be connected before running a query")
        })
    }

    /// Execute arbitrary SQL through the shared handle.
    pub async fn query(&self, sql: &str, params: &[SqlParam]) -> DbResult<QueryOutcome> {
        let db = self.database().await?;
        db.query(sql, params).await
    }

    /// Run a transactional batch through the shared handle.
    ///
    /// See [`perform_transaction`] for the sequencing and rollback contract.
    pub async fn perform_transaction(
        &self,
        actions: &[TransactionAction],
    ) -> DbResult<TransactionOutcome> {
        let db = self.database().await?;
        perform_transaction(&db, actions).await
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StubDatabase;
    use serde_json::json;

    #[tokio::test]
    async fn test_duplicate_model_fails() {
        let registry = ModelRegistry::new();
        registry
            .create_model("games", &json!({"id": "bigint"}))
            .await
            .unwrap();

        let err = registry
            .create_model("games", &json!({"id": "bigint"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already been defined"));
    }

    #[tokio::test]
    async fn test_rebind_propagates_to_tables() {
        let registry = ModelRegistry::new();
        let table = registry
            .create_model("games", &json!({"id": "bigint"}))
            .await
            .unwrap();
        assert!(!table.is_bound().await);

        registry.rebind(Database::Stub(StubDatabase::new())).await;
        assert!(table.is_bound().await);
        assert!(registry.is_connected().await);
    }

    #[tokio::test]
    async fn test_late_model_binds_immediately() {
        let registry = ModelRegistry::new();
        registry.rebind(Database::Stub(StubDatabase::new())).await;

        let table = registry
            .create_model("games", &json!({"id": "bigint"}))
            .await
            .unwrap();
        assert!(table.is_bound().await);
    }

    #[tokio::test]
    async fn test_close_detaches_tables() {
        let registry = ModelRegistry::new();
        let table = registry
            .create_model("games", &json!({"id": "bigint"}))
            .await
            .unwrap();
        registry.rebind(Database::Stub(StubDatabase::new())).await;

        registry.close().await;
        assert!(!registry.is_connected().await);
        assert!(!table.is_bound().await);

        // Idempotent.
        registry.close().await;
    }

    #[tokio::test]
    async fn test_query_requires_connection() {
        let registry = ModelRegistry::new();
        let err = registry.query("SELECT 1", &[]).await.unwrap_err();
        assert!(err.is_precondition());
    }

    #[tokio::test]
    async fn test_deregister_removes_and_unbinds() {
        let registry = ModelRegistry::new();
        registry
            .create_model("games", &json!({"id": "bigint"}))
            .await
            .unwrap();
        registry.rebind(Database::Stub(StubDatabase::new())).await;

        let removed = registry.deregister("games").await.unwrap();
        assert!(!removed.is_bound().await);
        assert!(registry.get("games").await.is_none());

        // The name is free for redeclaration.
        assert!(
            registry
                .create_model("games", &json!({"id": "bigint"}))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_fixture_requires_registered_model() {
        let registry = ModelRegistry::new();
        assert!(registry.fixture("games").await.is_err());

        registry
            .create_model("games", &json!({"id": "bigint"}))
            .await
            .unwrap();
        assert!(registry.fixture("games").await.is_ok());
    }
}
