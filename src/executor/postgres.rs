// executor/postgres.rs - Blocking PostgreSQL executor on the `postgres` crate

use std::io::Write;

use ::postgres::{Client, NoTls};

use crate::error::{CatalogError, QueryExecutionError};
use crate::executor::{BulkLoader, QueryExecutor, TableCursor, TableDescriptor};

const LIST_TABLES_SQL: &str = r#"
    SELECT table_catalog::text, table_schema::text, table_name::text, table_type::text
    FROM information_schema.tables
"#;

pub struct PostgresQueryExecutor {
    database: String,
    client: Client,
}

impl PostgresQueryExecutor {
    pub fn connect(database: impl Into<String>, url: &str) -> Result<Self, CatalogError> {
        let database = database.into();
        let client = Client::connect(url, NoTls).map_err(|e| CatalogError::Connection {
            database: database.clone(),
            message: e.to_string(),
        })?;
        tracing::debug!(database = %database, "connected to PostgreSQL");
        Ok(Self { database, client })
    }

    pub fn from_client(database: impl Into<String>, client: Client) -> Self {
        Self {
            database: database.into(),
            client,
        }
    }

    pub fn client(&mut self) -> &mut Client {
        &mut self.client
    }
}

impl QueryExecutor for PostgresQueryExecutor {
    fn database_name(&self) -> &str {
        &self.database
    }

    fn execute(&mut self, sql: &str) -> Result<(), QueryExecutionError> {
        self.client
            .batch_execute(sql)
            .map_err(|e| QueryExecutionError::new(sql, e.to_string()))
    }

    fn list_tables(&mut self) -> Result<TableCursor, CatalogError> {
        let rows = self
            .client
            .query(LIST_TABLES_SQL, &[])
            .map_err(|e| CatalogError::Enumeration {
                database: self.database.clone(),
                message: e.to_string(),
            })?;

        let database = self.database.clone();
        Ok(TableCursor::new(rows.into_iter().map(move |row| -> Result<TableDescriptor, CatalogError> {
            let descriptor = TableDescriptor {
                catalog: row.try_get(0).map_err(|e| enumeration_error(&database, e))?,
                schema: row.try_get(1).map_err(|e| enumeration_error(&database, e))?,
                name: row.try_get(2).map_err(|e| enumeration_error(&database, e))?,
                table_type: row.try_get(3).map_err(|e| enumeration_error(&database, e))?,
            };
            Ok(descriptor)
        })))
    }
}

impl BulkLoader for PostgresQueryExecutor {
    fn copy_in(&mut self, statement: &str, payload: &[u8]) -> Result<u64, QueryExecutionError> {
        let error = |e: &dyn std::fmt::Display| QueryExecutionError::new(statement, e.to_string());
        let mut writer = self.client.copy_in(statement).map_err(|e| error(&e))?;
        writer.write_all(payload).map_err(|e| error(&e))?;
        writer.finish().map_err(|e| error(&e))
    }
}

fn enumeration_error(database: &str, e: ::postgres::Error) -> CatalogError {
    CatalogError::Enumeration {
        database: database.to_string(),
        message: e.to_string(),
    }
}
