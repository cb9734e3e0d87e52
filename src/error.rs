//! Error types for tablemap.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! The variants follow the crate's failure taxonomy: definition errors abort schema or
//! registry construction synchronously, precondition errors surface as failed async
//! results before any database work happens, and database errors carry whatever the
//! driver reported (with the SQLSTATE preserved when available).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Definition error: {message}")]
    Definition { message: String },

    #[error("Precondition failed: {message}")]
    Precondition { message: String },

    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "23505" for a unique violation
        sql_state: Option<String>,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a definition error (invalid schema or registry declaration).
    pub fn definition(message: impl Into<String>) -> Self {
        Self::Definition {
            message: message.into(),
        }
    }

    /// Create a precondition error (operation attempted in an invalid state).
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a database execution error with an optional SQLSTATE code.
    pub fn database(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the SQLSTATE code for this error, if the driver reported one.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Database { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    /// Check whether this error happened before any statement reached the database.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Definition { .. } | Self::Precondition { .. })
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(msg.to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(db_err.message(), code)
            }
            sqlx::Error::RowNotFound => DbError::database("No rows returned", None),
            sqlx::Error::PoolTimedOut => {
                DbError::connection("Timed out acquiring a connection from the pool")
            }
            sqlx::Error::PoolClosed => DbError::connection("Connection pool is closed"),
            sqlx::Error::Io(io_err) => DbError::connection(format!("I/O error: {}", io_err)),
            sqlx::Error::Tls(tls_err) => DbError::connection(format!("TLS error: {}", tls_err)),
            sqlx::Error::Protocol(msg) => DbError::connection(format!("Protocol error: {}", msg)),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::database(format!("Column not found: {}", col), None)
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
