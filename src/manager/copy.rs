// manager/copy.rs - Table manager that bulk loads with COPY
//
// CREATE TABLE, then all rows in a single `COPY ... FROM STDIN` in text format.

use crate::error::{QueryExecutionError, Result};
use crate::executor::{BulkLoader, QueryExecutor};
use crate::fixtures::value::copy_text_payload;
use crate::fixtures::{Backend, Row, TableDefinition};
use crate::manager::TableManager;
use crate::naming::TableNameGenerator;

pub struct CopyTableManager<E> {
    executor: E,
    naming: TableNameGenerator,
}

impl<E: QueryExecutor + BulkLoader> CopyTableManager<E> {
    pub fn new(executor: E, naming: TableNameGenerator) -> Self {
        Self { executor, naming }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    fn copy_rows(&mut self, definition: &TableDefinition, name_in_database: &str) -> Result<u64> {
        let Some(source) = definition.data() else {
            return Ok(0);
        };
        let rows: Vec<Row> = source.rows().collect();
        for (index, row) in rows.iter().enumerate() {
            definition.check_row(index, row)?;
        }
        if rows.is_empty() {
            return Ok(0);
        }

        let statement = format!(
            "COPY {} ({}) FROM STDIN",
            name_in_database,
            definition.column_names().join(", ")
        );
        let payload = copy_text_payload(&rows);
        let loaded = self.executor.copy_in(&statement, payload.as_bytes())?;
        if loaded != rows.len() as u64 {
            return Err(QueryExecutionError::new(
                statement,
                format!("expected {} rows to be copied, database reported {loaded}", rows.len()),
            )
            .into());
        }
        Ok(loaded)
    }
}

impl<E: QueryExecutor + BulkLoader> TableManager for CopyTableManager<E> {
    fn database_name(&self) -> &str {
        self.executor.database_name()
    }

    fn backend(&self) -> Backend {
        Backend::PostgresCopy
    }

    fn create_table(&mut self, definition: &TableDefinition, name_in_database: &str, load_data: bool) -> Result<()> {
        self.executor.execute(&definition.create_table_sql(name_in_database))?;
        if load_data {
            let rows = self.copy_rows(definition, name_in_database)?;
            tracing::debug!(database = %self.database_name(), table = %name_in_database, rows, "copied fixture rows");
        }
        Ok(())
    }

    fn collaborators(&mut self) -> (&mut dyn QueryExecutor, &TableNameGenerator) {
        (&mut self.executor, &self.naming)
    }
}
