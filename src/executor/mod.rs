// executor/mod.rs - The query execution capability
//
// Table managers never talk to a driver directly. They need three things:
// run a statement, list the tables the catalog knows about, and (for the COPY
// variant) stream rows in bulk. Connection handling, quoting and retries
// belong to whoever implements these traits.

pub mod memory;
#[cfg(feature = "db-tools")]
pub mod pool;
#[cfg(feature = "db-tools")]
pub mod postgres;

pub use memory::InMemoryQueryExecutor;
#[cfg(feature = "db-tools")]
pub use self::pool::SqlxQueryExecutor;
#[cfg(feature = "db-tools")]
pub use self::postgres::PostgresQueryExecutor;

use std::fmt;

use crate::error::{CatalogError, QueryExecutionError};

/// Executes statements against one database. Every call blocks until the
/// database answers.
pub trait QueryExecutor {
    /// Name used in logs and errors.
    fn database_name(&self) -> &str;

    fn execute(&mut self, sql: &str) -> Result<(), QueryExecutionError>;

    /// Lists every table visible to the connection, without any
    /// catalog, schema, name or type filter.
    fn list_tables(&mut self) -> Result<TableCursor, CatalogError>;
}

/// Streams rows into a table with `COPY ... FROM STDIN`.
pub trait BulkLoader {
    /// Sends `payload` (COPY text format) for `statement` and returns the
    /// number of rows the database accepted.
    fn copy_in(&mut self, statement: &str, payload: &[u8]) -> Result<u64, QueryExecutionError>;
}

/// One entry of the table catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableDescriptor {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub name: Option<String>,
    pub table_type: Option<String>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

type CatalogRows = dyn Iterator<Item = Result<TableDescriptor, CatalogError>>;

/// An open enumeration of the table catalog.
///
/// The cursor owns whatever backs the enumeration and releases it when
/// dropped, whether iteration finished or not.
pub struct TableCursor {
    rows: Box<CatalogRows>,
}

impl TableCursor {
    pub fn new<I>(rows: I) -> Self
    where
        I: Iterator<Item = Result<TableDescriptor, CatalogError>> + 'static,
    {
        Self { rows: Box::new(rows) }
    }

    pub fn from_descriptors(descriptors: Vec<TableDescriptor>) -> Self {
        Self::new(descriptors.into_iter().map(Ok))
    }
}

impl Iterator for TableCursor {
    type Item = Result<TableDescriptor, CatalogError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }
}

impl fmt::Debug for TableCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableCursor").finish_non_exhaustive()
    }
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for Box<E> {
    fn database_name(&self) -> &str {
        (**self).database_name()
    }

    fn execute(&mut self, sql: &str) -> Result<(), QueryExecutionError> {
        (**self).execute(sql)
    }

    fn list_tables(&mut self) -> Result<TableCursor, CatalogError> {
        (**self).list_tables()
    }
}

impl<E: BulkLoader + ?Sized> BulkLoader for Box<E> {
    fn copy_in(&mut self, statement: &str, payload: &[u8]) -> Result<u64, QueryExecutionError> {
        (**self).copy_in(statement, payload)
    }
}
