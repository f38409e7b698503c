// error.rs - Error types for fixture table management
//
// Three kinds of failure matter here:
// - a single statement failed (recoverable, the caller decides)
// - the catalog could not be reached or read (fatal for a sweep)
// - a definition, configuration or registry lookup is wrong

use std::path::PathBuf;

use thiserror::Error;

use crate::fixtures::Backend;

/// A SQL statement was rejected by the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("query execution failed: {message} (sql: {sql})")]
pub struct QueryExecutionError {
    pub sql: String,
    pub message: String,
}

impl QueryExecutionError {
    pub fn new(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            message: message.into(),
        }
    }
}

/// Catalog metadata could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unable to connect to database {database}: {message}")]
    Connection { database: String, message: String },

    #[error("unable to enumerate tables in database {database}: {message}")]
    Enumeration { database: String, message: String },
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error(transparent)]
    Execution(#[from] QueryExecutionError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("invalid table definition {table}: {reason}")]
    InvalidDefinition { table: String, reason: String },

    #[error("no table manager registered for backend {backend} (database: {database})")]
    NoTableManager { backend: Backend, database: String },

    #[error("several table managers handle backend {backend} ({databases:?}); name a database in the table handle")]
    AmbiguousTableManager {
        backend: Backend,
        databases: Vec<String>,
    },

    #[error("a table manager for backend {backend} on database {database} is already registered")]
    DuplicateTableManager { backend: Backend, database: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FixtureError {
    pub(crate) fn invalid_definition(table: impl Into<String>, reason: impl Into<String>) -> Self {
        FixtureError::InvalidDefinition {
            table: table.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FixtureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_error_keeps_statement() {
        let err: FixtureError = QueryExecutionError::new("DROP TABLE t", "relation does not exist").into();
        let message = err.to_string();
        assert!(message.contains("DROP TABLE t"));
        assert!(message.contains("relation does not exist"));
    }

    #[test]
    fn catalog_error_converts() {
        let err: FixtureError = CatalogError::Enumeration {
            database: "hive".to_string(),
            message: "permission denied".to_string(),
        }
        .into();
        assert!(matches!(err, FixtureError::Catalog(CatalogError::Enumeration { .. })));
    }
}
