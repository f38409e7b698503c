// fixtures/instance.rs - Handles tests use and the tables they resolve to

use serde::{Deserialize, Serialize};

use crate::fixtures::definition::TableDefinition;

/// How far a mutable table is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutableTableState {
    /// Only the name is reserved; the test creates the table itself.
    Prepared,
    /// The table exists and is empty.
    Created,
    /// The table exists and holds the definition's data.
    Loaded,
}

/// The name a test uses for a table, optionally pinned to a database and schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableHandle {
    name: String,
    database: Option<String>,
    schema: Option<String>,
}

impl TableHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database: None,
            schema: None,
        }
    }

    pub fn for_definition(definition: &TableDefinition) -> Self {
        Self::new(definition.name())
    }

    pub fn in_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Prefixes `table` with the handle's schema, if any.
    pub fn qualify(&self, table: &str) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{table}"),
            None => table.to_string(),
        }
    }
}

/// A table materialized (or reserved) for a test.
#[derive(Debug, Clone)]
pub struct TableInstance {
    handle: TableHandle,
    definition: TableDefinition,
    database: String,
    name_in_database: String,
    mutable_state: Option<MutableTableState>,
}

impl TableInstance {
    pub(crate) fn new(
        handle: TableHandle,
        definition: TableDefinition,
        database: impl Into<String>,
        name_in_database: impl Into<String>,
        mutable_state: Option<MutableTableState>,
    ) -> Self {
        Self {
            handle,
            definition,
            database: database.into(),
            name_in_database: name_in_database.into(),
            mutable_state,
        }
    }

    pub fn handle(&self) -> &TableHandle {
        &self.handle
    }

    pub fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// The name to use in SQL, schema-qualified when the handle has a schema.
    pub fn name_in_database(&self) -> &str {
        &self.name_in_database
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable_state.is_some()
    }

    pub fn mutable_state(&self) -> Option<MutableTableState> {
        self.mutable_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualify_uses_schema() {
        let handle = TableHandle::new("orders").in_schema("tpch").in_database("presto");
        assert_eq!(handle.qualify("fixture_mut_orders_a1b2c3d4"), "tpch.fixture_mut_orders_a1b2c3d4");
        assert_eq!(handle.database(), Some("presto"));
        assert_eq!(TableHandle::new("orders").qualify("orders"), "orders");
    }
}
