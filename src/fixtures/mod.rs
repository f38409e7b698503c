// fixtures/mod.rs - Test fixture model
//
// What is a fixture table?
// A table created only so a test can run against it. Tests describe the
// table once (a TableDefinition) and the managers materialize it under a
// name of their choosing.
//
// Fixed tables are shared between tests and keep their declared name.
// Mutable tables get a generated name per test and are dropped afterwards.

pub mod data_source;
pub mod definition;
pub mod instance;
pub mod tables;
pub mod value;

pub use data_source::{GeneratedRows, InlineRows, TableDataSource};
pub use definition::{Backend, Column, ColumnType, TableDefinition, TableDefinitionBuilder};
pub use instance::{MutableTableState, TableHandle, TableInstance};
pub use value::{Row, Value};

use crate::error::Result;

/// A fixture table shipped with the crate.
pub trait TestTable {
    fn definition() -> Result<TableDefinition>;
}
