// common/mod.rs - Shared test utilities
//
// Builders for in-memory managers and small definitions, plus helpers for
// the live PostgreSQL suite (isolated schema names, connection settings).

#![allow(dead_code)]

use table_fixtures::fixtures::ColumnType;
use table_fixtures::{
    Backend, CopyTableManager, InMemoryQueryExecutor, SqlTableManager, TableDefinition, TableManagerDispatcher,
    TableNameGenerator, Value,
};

pub const DATABASE: &str = "memory";

/// A two-column definition with `rows` generated rows.
pub fn orders(rows: usize) -> TableDefinition {
    TableDefinition::builder("orders")
        .column("o_orderkey", ColumnType::BigInt)
        .nullable_column("o_comment", ColumnType::Text)
        .generated_rows(rows, |i| vec![Value::Int(i as i64), Value::from(format!("order {i}"))])
        .build()
        .expect("orders definition is valid")
}

pub fn nation(backend: Backend) -> TableDefinition {
    TableDefinition::builder("nation")
        .backend(backend)
        .column("n_nationkey", ColumnType::Integer)
        .column("n_name", ColumnType::Varchar { length: 25 })
        .rows(vec![
            vec![Value::Int(0), Value::from("ALGERIA")],
            vec![Value::Int(1), Value::from("ARGENTINA")],
            vec![Value::Int(2), Value::from("BRAZIL")],
        ])
        .build()
        .expect("nation definition is valid")
}

pub fn sql_manager(executor: &InMemoryQueryExecutor, naming: &TableNameGenerator) -> SqlTableManager<InMemoryQueryExecutor> {
    SqlTableManager::new(executor.clone(), naming.clone())
}

/// A dispatcher with an INSERT-loading and a COPY-loading manager over the
/// same in-memory database.
pub fn memory_dispatcher(executor: &InMemoryQueryExecutor, naming: &TableNameGenerator) -> TableManagerDispatcher {
    let mut dispatcher = TableManagerDispatcher::new();
    dispatcher
        .register(SqlTableManager::new(executor.clone(), naming.clone()))
        .expect("sql manager registers");
    dispatcher
        .register(CopyTableManager::new(executor.clone(), naming.clone()))
        .expect("copy manager registers");
    dispatcher
}

#[cfg(feature = "db-tools")]
pub mod postgres {
    use std::env;

    use table_fixtures::{Backend, DatabaseConfig, FixtureConfig};

    /// DATABASE_URL, loading `.env` first.
    pub fn database_url() -> String {
        dotenv::dotenv().ok();
        env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment")
    }

    /// Generate a unique schema name for a test
    ///
    /// Sanitized to `[a-z0-9_]` and truncated so PostgreSQL keeps all of it.
    pub fn generate_test_schema_name(test_name: &str) -> String {
        let sanitized = test_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c.to_ascii_lowercase() } else { '_' })
            .collect::<String>();

        let truncated = if sanitized.len() > 50 { &sanitized[..50] } else { &sanitized };

        format!("test_{}", truncated)
    }

    pub fn config(backend: Backend, prefix: &str) -> FixtureConfig {
        FixtureConfig {
            databases: vec![DatabaseConfig {
                name: "postgres".to_string(),
                url: database_url(),
                backend,
            }],
            mutable_table_prefix: prefix.to_string(),
            insert_batch_size: 4,
            sweep_on_startup: false,
        }
    }
}
