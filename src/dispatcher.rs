// dispatcher.rs - Picks the table manager for a definition
//
// Managers are registered per (database, backend). A definition names its
// backend; a handle may additionally name a database. When the handle does
// not, the backend alone must identify exactly one manager.

use crate::error::{FixtureError, Result};
use crate::fixtures::{MutableTableState, TableDefinition, TableHandle, TableInstance};
use crate::manager::{DropOutcome, SweepReport, TableManager, TableManagerExt};

#[derive(Default)]
pub struct TableManagerDispatcher {
    managers: Vec<Box<dyn TableManager>>,
}

impl TableManagerDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M>(&mut self, manager: M) -> Result<()>
    where
        M: TableManager + 'static,
    {
        self.register_boxed(Box::new(manager))
    }

    pub fn register_boxed(&mut self, manager: Box<dyn TableManager>) -> Result<()> {
        let duplicate = self
            .managers
            .iter()
            .any(|m| m.backend() == manager.backend() && m.database_name() == manager.database_name());
        if duplicate {
            return Err(FixtureError::DuplicateTableManager {
                backend: manager.backend(),
                database: manager.database_name().to_string(),
            });
        }
        tracing::debug!(
            database = %manager.database_name(),
            backend = %manager.backend(),
            "registered table manager"
        );
        self.managers.push(manager);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    /// Distinct database names, in registration order.
    pub fn database_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for manager in &self.managers {
            if !names.contains(&manager.database_name()) {
                names.push(manager.database_name());
            }
        }
        names
    }

    pub fn manager_for(&mut self, definition: &TableDefinition, handle: &TableHandle) -> Result<&mut dyn TableManager> {
        let backend = definition.backend();
        let candidates: Vec<usize> = self
            .managers
            .iter()
            .enumerate()
            .filter(|(_, m)| m.backend() == backend)
            .filter(|(_, m)| handle.database().map_or(true, |db| m.database_name() == db))
            .map(|(index, _)| index)
            .collect();

        match candidates.as_slice() {
            [] => Err(FixtureError::NoTableManager {
                backend,
                database: handle.database().unwrap_or("<any>").to_string(),
            }),
            [index] => Ok(self.managers[*index].as_mut()),
            several => Err(FixtureError::AmbiguousTableManager {
                backend,
                databases: several
                    .iter()
                    .map(|i| self.managers[*i].database_name().to_string())
                    .collect(),
            }),
        }
    }

    pub fn create_mutable(
        &mut self,
        definition: &TableDefinition,
        state: MutableTableState,
        handle: &TableHandle,
    ) -> Result<TableInstance> {
        self.manager_for(definition, handle)?
            .create_mutable(definition, state, handle)
    }

    pub fn create_immutable(&mut self, definition: &TableDefinition, handle: &TableHandle) -> Result<TableInstance> {
        self.manager_for(definition, handle)?.create_immutable(definition, handle)
    }

    /// Drops `name` through the first manager registered for `database`.
    pub fn drop_table(&mut self, database: &str, name: &str) -> Result<()> {
        self.manager_for_database(database)?.drop_table(name)
    }

    pub fn drop_table_ignore_error(&mut self, database: &str, name: &str) -> Result<DropOutcome> {
        Ok(self.manager_for_database(database)?.drop_table_ignore_error(name))
    }

    /// Sweeps each registered database once per distinct mutable table
    /// prefix used on it.
    ///
    /// Stops at the first database whose catalog cannot be read.
    pub fn drop_all_mutable_tables(&mut self) -> Result<Vec<SweepReport>> {
        let mut swept: Vec<(String, String)> = Vec::new();
        let mut reports = Vec::new();
        for manager in &mut self.managers {
            let database = manager.database_name().to_string();
            let prefix = manager.collaborators().1.prefix().to_string();
            if swept.iter().any(|(db, p)| *db == database && *p == prefix) {
                continue;
            }
            swept.push((database, prefix));
            reports.push(manager.drop_all_mutable_tables()?);
        }
        Ok(reports)
    }

    fn manager_for_database(&mut self, database: &str) -> Result<&mut dyn TableManager> {
        match self.managers.iter_mut().find(|m| m.database_name() == database) {
            Some(manager) => Ok(manager.as_mut()),
            None => Err(FixtureError::Configuration(format!(
                "no table manager registered for database {database}"
            ))),
        }
    }
}
