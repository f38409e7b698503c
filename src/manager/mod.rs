// manager/mod.rs - Table managers
//
// A table manager materializes table definitions in one database. Variants
// differ only in how they create and load a table (`create_table`); naming,
// dropping and the mutable table sweep are provided once by TableManagerExt,
// which is implemented for every manager and cannot be overridden.

pub mod copy;
pub mod sql;
mod sweep;

pub use copy::CopyTableManager;
pub use sql::SqlTableManager;

use serde::Serialize;

use crate::error::{FixtureError, Result};
use crate::executor::QueryExecutor;
use crate::fixtures::{Backend, MutableTableState, TableDefinition, TableHandle, TableInstance};
use crate::naming::TableNameGenerator;

/// Backend-specific part of a table manager.
pub trait TableManager {
    fn database_name(&self) -> &str;

    fn backend(&self) -> Backend;

    /// Creates `name_in_database` from `definition` and, when `load_data` is
    /// set, loads the definition's rows into it.
    fn create_table(&mut self, definition: &TableDefinition, name_in_database: &str, load_data: bool) -> Result<()>;

    /// The executor and name generator the shared behavior works with.
    fn collaborators(&mut self) -> (&mut dyn QueryExecutor, &TableNameGenerator);
}

/// Result of a drop that is not allowed to fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Dropped,
    Failed(DropFailure),
}

impl DropOutcome {
    pub fn is_dropped(&self) -> bool {
        matches!(self, DropOutcome::Dropped)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropFailure {
    pub table: String,
    pub reason: String,
}

/// What a sweep did. Tolerated failures are listed, not raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub database: String,
    /// Catalog entries looked at.
    pub examined: usize,
    pub dropped: Vec<String>,
    pub failures: Vec<DropFailure>,
}

impl SweepReport {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Lifecycle operations shared by all table managers.
pub trait TableManagerExt: TableManager {
    /// Creates a test-owned table under a freshly generated name.
    fn create_mutable(
        &mut self,
        definition: &TableDefinition,
        state: MutableTableState,
        handle: &TableHandle,
    ) -> Result<TableInstance>;

    /// Creates a shared table under the definition's own name, unless the
    /// catalog already lists it.
    fn create_immutable(&mut self, definition: &TableDefinition, handle: &TableHandle) -> Result<TableInstance>;

    /// `DROP TABLE name`; failures are returned.
    fn drop_table(&mut self, name: &str) -> Result<()>;

    /// `DROP TABLE name`; failures are logged and reported, never returned.
    fn drop_table_ignore_error(&mut self, name: &str) -> DropOutcome;

    /// Drops every table in the catalog whose name classifies as mutable.
    fn drop_all_mutable_tables(&mut self) -> Result<SweepReport>;
}

impl<M: TableManager + ?Sized> TableManagerExt for M {
    fn create_mutable(
        &mut self,
        definition: &TableDefinition,
        state: MutableTableState,
        handle: &TableHandle,
    ) -> Result<TableInstance> {
        let (_, naming) = self.collaborators();
        let name_in_database = handle.qualify(&naming.generate_mutable_name(definition));

        let load_data = match state {
            MutableTableState::Prepared => None,
            MutableTableState::Created => Some(false),
            MutableTableState::Loaded => Some(true),
        };
        if let Some(load_data) = load_data {
            if let Err(e) = self.create_table(definition, &name_in_database, load_data) {
                // the name is unique to this call, so whatever exists under it is ours
                let (executor, _) = self.collaborators();
                sweep::drop_table_ignore_error(executor, &name_in_database);
                return Err(e);
            }
        }

        tracing::debug!(
            database = %self.database_name(),
            table = %name_in_database,
            definition = %definition.name(),
            ?state,
            "mutable table ready"
        );
        Ok(TableInstance::new(
            handle.clone(),
            definition.clone(),
            self.database_name(),
            name_in_database,
            Some(state),
        ))
    }

    fn create_immutable(&mut self, definition: &TableDefinition, handle: &TableHandle) -> Result<TableInstance> {
        let (executor, naming) = self.collaborators();
        if naming.is_mutable_table_name(definition.name()) {
            return Err(FixtureError::invalid_definition(
                definition.name(),
                "immutable table name matches the mutable naming convention",
            ));
        }
        let exists = sweep::table_exists(executor, handle.schema(), definition.name())?;

        let name_in_database = handle.qualify(definition.name());
        if exists {
            tracing::debug!(database = %self.database_name(), table = %name_in_database, "reusing immutable table");
        } else {
            self.create_table(definition, &name_in_database, true)?;
            tracing::info!(database = %self.database_name(), table = %name_in_database, "created immutable table");
        }
        Ok(TableInstance::new(
            handle.clone(),
            definition.clone(),
            self.database_name(),
            name_in_database,
            None,
        ))
    }

    fn drop_table(&mut self, name: &str) -> Result<()> {
        let (executor, _) = self.collaborators();
        sweep::drop_table(executor, name)
    }

    fn drop_table_ignore_error(&mut self, name: &str) -> DropOutcome {
        let (executor, _) = self.collaborators();
        sweep::drop_table_ignore_error(executor, name)
    }

    fn drop_all_mutable_tables(&mut self) -> Result<SweepReport> {
        let (executor, naming) = self.collaborators();
        sweep::drop_all_mutable_tables(executor, naming)
    }
}
