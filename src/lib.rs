// lib.rs - Root module for the table_fixtures library
//
// Creates the database tables integration tests run against and removes them
// again. Tests describe tables (fixtures), a dispatcher routes each
// definition to the table manager for its backend, and managers create
// tables under generated names that a later sweep can recognize and drop
// without any bookkeeping of its own.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod fixtures;
pub mod fulfillment;
pub mod logging;
pub mod manager;
pub mod naming;

#[cfg(feature = "db-tools")]
pub mod bootstrap;

pub use config::{DatabaseConfig, FixtureConfig};
pub use dispatcher::TableManagerDispatcher;
pub use error::{CatalogError, FixtureError, QueryExecutionError, Result};
pub use executor::{BulkLoader, InMemoryQueryExecutor, QueryExecutor, TableCursor, TableDescriptor};
pub use fixtures::{Backend, MutableTableState, TableDefinition, TableHandle, TableInstance, Value};
pub use fulfillment::{
    fulfill_immutable_tables, ImmutableTableRequirement, MutableTableRequirement, MutableTablesFulfiller, TablesState,
};
pub use manager::{
    CopyTableManager, DropFailure, DropOutcome, SqlTableManager, SweepReport, TableManager, TableManagerExt,
};
pub use naming::TableNameGenerator;
