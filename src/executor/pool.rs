// executor/pool.rs - PostgreSQL executor on a sqlx pool
//
// sqlx is async; table managers are not. The executor owns a current-thread
// tokio runtime and blocks on every call, so it must not be used from inside
// another tokio runtime.

use std::time::Duration;

use sqlx::postgres::{PgPoolCopyExt, PgPoolOptions};
use sqlx::PgPool;
use tokio::runtime::{Builder, Runtime};

use crate::error::{CatalogError, QueryExecutionError};
use crate::executor::{BulkLoader, QueryExecutor, TableCursor, TableDescriptor};

const LIST_TABLES_SQL: &str = r#"
    SELECT table_catalog::text, table_schema::text, table_name::text, table_type::text
    FROM information_schema.tables
"#;

type CatalogRow = (Option<String>, Option<String>, Option<String>, Option<String>);

pub struct SqlxQueryExecutor {
    database: String,
    runtime: Runtime,
    pool: PgPool,
}

impl SqlxQueryExecutor {
    pub fn connect(database: impl Into<String>, url: &str, max_connections: u32) -> Result<Self, CatalogError> {
        let database = database.into();
        let connection_error = |message: String| CatalogError::Connection {
            database: database.clone(),
            message,
        };

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| connection_error(e.to_string()))?;
        let pool = runtime
            .block_on(
                PgPoolOptions::new()
                    .max_connections(max_connections)
                    .min_connections(1)
                    .acquire_timeout(Duration::from_secs(5))
                    .connect(url),
            )
            .map_err(|e| connection_error(e.to_string()))?;

        tracing::debug!(database = %database, max_connections, "connected sqlx pool");
        Ok(Self {
            database,
            runtime,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl QueryExecutor for SqlxQueryExecutor {
    fn database_name(&self) -> &str {
        &self.database
    }

    fn execute(&mut self, sql: &str) -> Result<(), QueryExecutionError> {
        self.runtime
            .block_on(sqlx::raw_sql(sql).execute(&self.pool))
            .map(|_| ())
            .map_err(|e| QueryExecutionError::new(sql, e.to_string()))
    }

    fn list_tables(&mut self) -> Result<TableCursor, CatalogError> {
        let rows: Vec<CatalogRow> = self
            .runtime
            .block_on(sqlx::query_as(LIST_TABLES_SQL).fetch_all(&self.pool))
            .map_err(|e| CatalogError::Enumeration {
                database: self.database.clone(),
                message: e.to_string(),
            })?;

        Ok(TableCursor::from_descriptors(
            rows.into_iter()
                .map(|(catalog, schema, name, table_type)| TableDescriptor {
                    catalog,
                    schema,
                    name,
                    table_type,
                })
                .collect(),
        ))
    }
}

impl BulkLoader for SqlxQueryExecutor {
    fn copy_in(&mut self, statement: &str, payload: &[u8]) -> Result<u64, QueryExecutionError> {
        let pool = &self.pool;
        self.runtime
            .block_on(async move {
                let mut copy = pool.copy_in_raw(statement).await?;
                copy.send(payload).await?;
                copy.finish().await
            })
            .map_err(|e| QueryExecutionError::new(statement, e.to_string()))
    }
}
