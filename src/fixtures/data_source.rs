// fixtures/data_source.rs - Where fixture rows come from

use std::fmt;

use crate::fixtures::value::Row;

/// Supplies the rows loaded into a fixture table.
///
/// Sources are shared between every table created from the same definition,
/// so `rows` must produce the same data each time it is called.
pub trait TableDataSource: Send + Sync {
    fn rows(&self) -> Box<dyn Iterator<Item = Row> + '_>;

    fn row_count_hint(&self) -> Option<usize> {
        None
    }
}

/// Rows written out in full.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineRows {
    rows: Vec<Row>,
}

impl InlineRows {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn as_slice(&self) -> &[Row] {
        &self.rows
    }
}

impl TableDataSource for InlineRows {
    fn rows(&self) -> Box<dyn Iterator<Item = Row> + '_> {
        Box::new(self.rows.iter().cloned())
    }

    fn row_count_hint(&self) -> Option<usize> {
        Some(self.rows.len())
    }
}

type RowGenerator = dyn Fn(usize) -> Row + Send + Sync;

/// `count` rows produced on demand by a generator called with the row index.
pub struct GeneratedRows {
    count: usize,
    generator: Box<RowGenerator>,
}

impl GeneratedRows {
    pub fn new<F>(count: usize, generator: F) -> Self
    where
        F: Fn(usize) -> Row + Send + Sync + 'static,
    {
        Self {
            count,
            generator: Box::new(generator),
        }
    }
}

impl fmt::Debug for GeneratedRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedRows")
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

impl TableDataSource for GeneratedRows {
    fn rows(&self) -> Box<dyn Iterator<Item = Row> + '_> {
        Box::new((0..self.count).map(|index| (self.generator)(index)))
    }

    fn row_count_hint(&self) -> Option<usize> {
        Some(self.count)
    }
}
