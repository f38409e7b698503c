// fixtures/tables/mod.rs
//
// Ready-made fixture tables. Each one is a struct implementing TestTable.

pub mod products;

pub use products::ProductsTable;
