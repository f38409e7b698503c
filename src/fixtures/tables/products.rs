// fixtures/tables/products.rs
//
// A small e-commerce catalog. Ten products across five categories, including
// names with punctuation ("Wi-Fi 6 Router") and duplicate prices, which makes
// it a reasonable default fixture for loading and query tests.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fixtures::{ColumnType, TableDefinition, TestTable, Value};

/// One row of the products fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db-tools", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub rating: Option<Decimal>,
    pub in_stock: bool,
}

impl Product {
    fn new(id: i32, name: &str, description: &str, category: &str, price: i64, rating: i64) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            price: Decimal::new(price, 2),
            rating: Some(Decimal::new(rating, 1)),
            in_stock: true,
        }
    }

    fn into_row(self) -> Vec<Value> {
        vec![
            Value::from(self.id),
            Value::Text(self.name),
            Value::Text(self.description),
            Value::Text(self.category),
            Value::Decimal(self.price),
            Value::from(self.rating),
            Value::Bool(self.in_stock),
        ]
    }
}

pub struct ProductsTable;

impl ProductsTable {
    pub const NAME: &'static str = "products";

    pub fn products() -> Vec<Product> {
        vec![
            // Electronics & Gadgets
            Product::new(
                1,
                "Wireless Headphones",
                "High-quality wireless headphones with noise cancellation and 30-hour battery life",
                "Electronics",
                7999,
                45,
            ),
            Product::new(
                2,
                "USB-C Cable",
                "Fast charging USB-C cable, durable braided design, compatible with all devices",
                "Accessories",
                1299,
                47,
            ),
            Product::new(
                3,
                "Mechanical Keyboard",
                "Mechanical keyboard with RGB lighting and customizable keys",
                "Electronics",
                8999,
                49,
            ),
            // Pro series, for ranking
            Product::new(
                4,
                "Gaming Mouse Pro",
                "Professional gaming mouse with high DPI sensor and programmable buttons",
                "Electronics",
                5999,
                48,
            ),
            Product::new(
                5,
                "Standard Mouse",
                "Basic optical mouse, good for office work and casual pro gamers",
                "Electronics",
                1999,
                42,
            ),
            // Furniture
            Product::new(
                6,
                "Ergonomic Office Chair",
                "Comfortable office chair with lumbar support and adjustable height",
                "Furniture",
                19999,
                46,
            ),
            Product::new(
                7,
                "Gaming Chair",
                "Racing style gaming chair with reclining backrest",
                "Furniture",
                15999,
                44,
            ),
            // Special characters and duplicate prices
            Product::new(
                8,
                "Wi-Fi 6 Router",
                "Next-gen Wi-Fi 6 router for high-speed internet connectivity",
                "Networking",
                12999,
                47,
            ),
            Product::new(9, "Blue T-Shirt", "100% cotton blue t-shirt, comfortable fit", "Clothing", 1499, 43),
            Product::new(10, "Red T-Shirt", "100% cotton red t-shirt, comfortable fit", "Clothing", 1499, 43),
        ]
    }
}

impl TestTable for ProductsTable {
    fn definition() -> Result<TableDefinition> {
        TableDefinition::builder(Self::NAME)
            .column("id", ColumnType::Integer)
            .column("name", ColumnType::Varchar { length: 255 })
            .column("description", ColumnType::Text)
            .column("category", ColumnType::Varchar { length: 100 })
            .column("price", ColumnType::Decimal { precision: 10, scale: 2 })
            .nullable_column("rating", ColumnType::Decimal { precision: 3, scale: 2 })
            .column("in_stock", ColumnType::Boolean)
            .rows(Self::products().into_iter().map(Product::into_row).collect())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn products_definition_is_valid() {
        let definition = ProductsTable::definition().unwrap();
        assert_eq!(definition.name(), "products");
        assert_eq!(definition.columns().len(), 7);
        assert_eq!(definition.data().and_then(|d| d.row_count_hint()), Some(10));
    }

    #[test]
    fn prices_keep_two_decimals() {
        let products = ProductsTable::products();
        assert_eq!(products[0].price.to_string(), "79.99");
        assert_eq!(products[8].price, products[9].price);
    }
}
