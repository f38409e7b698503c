// fulfillment.rs - Turning a test's table requirements into tables
//
// Immutable tables are created once and shared. Mutable tables are created
// per test; the fulfiller remembers the ones it created so the test's
// teardown can drop exactly those. A crashed test leaves them behind for the
// next sweep instead.

use std::collections::BTreeMap;

use crate::dispatcher::TableManagerDispatcher;
use crate::error::Result;
use crate::fixtures::{MutableTableState, TableDefinition, TableHandle, TableInstance};
use crate::manager::{DropFailure, DropOutcome};

#[derive(Debug, Clone)]
pub struct ImmutableTableRequirement {
    pub definition: TableDefinition,
    pub handle: TableHandle,
}

impl ImmutableTableRequirement {
    pub fn new(definition: TableDefinition) -> Self {
        let handle = TableHandle::for_definition(&definition);
        Self { definition, handle }
    }

    pub fn with_handle(mut self, handle: TableHandle) -> Self {
        self.handle = handle;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MutableTableRequirement {
    pub definition: TableDefinition,
    pub state: MutableTableState,
    pub handle: TableHandle,
}

impl MutableTableRequirement {
    /// A loaded mutable table known to the test by the definition's name.
    pub fn new(definition: TableDefinition) -> Self {
        let handle = TableHandle::for_definition(&definition);
        Self {
            definition,
            state: MutableTableState::Loaded,
            handle,
        }
    }

    pub fn with_state(mut self, state: MutableTableState) -> Self {
        self.state = state;
        self
    }

    pub fn with_handle(mut self, handle: TableHandle) -> Self {
        self.handle = handle;
        self
    }
}

/// Tables available to a test, by handle name.
#[derive(Debug, Clone, Default)]
pub struct TablesState {
    tables: BTreeMap<String, TableInstance>,
}

impl TablesState {
    pub fn get(&self, handle_name: &str) -> Option<&TableInstance> {
        self.tables.get(handle_name)
    }

    pub fn name_in_database(&self, handle_name: &str) -> Option<&str> {
        self.get(handle_name).map(TableInstance::name_in_database)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableInstance> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn insert(&mut self, instance: TableInstance) {
        self.tables.insert(instance.handle().name().to_string(), instance);
    }
}

pub fn fulfill_immutable_tables(
    dispatcher: &mut TableManagerDispatcher,
    requirements: &[ImmutableTableRequirement],
) -> Result<TablesState> {
    let mut state = TablesState::default();
    for requirement in requirements {
        state.insert(dispatcher.create_immutable(&requirement.definition, &requirement.handle)?);
    }
    Ok(state)
}

/// Creates mutable tables for one test and drops them again on cleanup.
#[derive(Debug, Default)]
pub struct MutableTablesFulfiller {
    created: Vec<TableInstance>,
}

impl MutableTablesFulfiller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates every requirement in order. Tables created before a failing
    /// requirement stay registered for `cleanup`.
    pub fn fulfill(
        &mut self,
        dispatcher: &mut TableManagerDispatcher,
        requirements: &[MutableTableRequirement],
    ) -> Result<TablesState> {
        let mut state = TablesState::default();
        for requirement in requirements {
            let instance = dispatcher.create_mutable(&requirement.definition, requirement.state, &requirement.handle)?;
            self.created.push(instance.clone());
            state.insert(instance);
        }
        Ok(state)
    }

    /// Tables created (or, for `Prepared`, reserved) so far and not yet cleaned up.
    pub fn created(&self) -> &[TableInstance] {
        &self.created
    }

    /// Drops every created table, newest first. Failures are returned, not raised.
    ///
    /// Prepared tables are dropped too, since the test may have created them;
    /// if it did not, their drop shows up as a failure.
    pub fn cleanup(&mut self, dispatcher: &mut TableManagerDispatcher) -> Vec<DropFailure> {
        let mut failures = Vec::new();
        while let Some(instance) = self.created.pop() {
            let outcome = dispatcher.drop_table_ignore_error(instance.database(), instance.name_in_database());
            match outcome {
                Ok(DropOutcome::Dropped) => {}
                Ok(DropOutcome::Failed(failure)) => failures.push(failure),
                Err(e) => failures.push(DropFailure {
                    table: instance.name_in_database().to_string(),
                    reason: e.to_string(),
                }),
            }
        }
        if !failures.is_empty() {
            tracing::warn!(failed = failures.len(), "some mutable tables could not be dropped");
        }
        failures
    }
}
