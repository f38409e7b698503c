// manager/sql.rs - Table manager for plain SQL databases
//
// CREATE TABLE, then the definition's rows as multi-row INSERT statements.

use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::fixtures::{Backend, TableDefinition};
use crate::manager::TableManager;
use crate::naming::TableNameGenerator;

pub const DEFAULT_INSERT_BATCH_SIZE: usize = 500;

pub struct SqlTableManager<E> {
    executor: E,
    naming: TableNameGenerator,
    batch_size: usize,
}

impl<E: QueryExecutor> SqlTableManager<E> {
    pub fn new(executor: E, naming: TableNameGenerator) -> Self {
        Self {
            executor,
            naming,
            batch_size: DEFAULT_INSERT_BATCH_SIZE,
        }
    }

    /// Rows per INSERT statement; at least one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    fn insert_rows(&mut self, definition: &TableDefinition, name_in_database: &str) -> Result<usize> {
        let Some(source) = definition.data() else {
            return Ok(0);
        };
        let prefix = format!(
            "INSERT INTO {} ({}) VALUES ",
            name_in_database,
            definition.column_names().join(", ")
        );

        let mut tuples = Vec::with_capacity(self.batch_size);
        let mut inserted = 0;
        for (index, row) in source.rows().enumerate() {
            definition.check_row(index, &row)?;
            let literals: Vec<String> = row.iter().map(|v| v.to_sql_literal()).collect();
            tuples.push(format!("({})", literals.join(", ")));
            if tuples.len() == self.batch_size {
                inserted += tuples.len();
                self.executor.execute(&format!("{prefix}{}", tuples.join(", ")))?;
                tuples.clear();
            }
        }
        if !tuples.is_empty() {
            inserted += tuples.len();
            self.executor.execute(&format!("{prefix}{}", tuples.join(", ")))?;
        }
        Ok(inserted)
    }
}

impl<E: QueryExecutor> TableManager for SqlTableManager<E> {
    fn database_name(&self) -> &str {
        self.executor.database_name()
    }

    fn backend(&self) -> Backend {
        Backend::Sql
    }

    fn create_table(&mut self, definition: &TableDefinition, name_in_database: &str, load_data: bool) -> Result<()> {
        self.executor.execute(&definition.create_table_sql(name_in_database))?;
        if load_data {
            let rows = self.insert_rows(definition, name_in_database)?;
            tracing::debug!(database = %self.database_name(), table = %name_in_database, rows, "inserted fixture rows");
        }
        Ok(())
    }

    fn collaborators(&mut self) -> (&mut dyn QueryExecutor, &TableNameGenerator) {
        (&mut self.executor, &self.naming)
    }
}
