// fixtures/definition.rs - Table definitions declared by tests
//
// A definition says what a table looks like (columns), what goes in it
// (an optional data source) and which backend materializes it. It never says
// what the table is called in the database: that is decided at creation time.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FixtureError, Result};
use crate::fixtures::data_source::{GeneratedRows, InlineRows, TableDataSource};
use crate::fixtures::value::{Row, Value};

/// Which table manager variant materializes a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Any SQL database; rows are loaded with multi-row INSERT statements.
    #[default]
    Sql,
    /// PostgreSQL; rows are bulk loaded with `COPY ... FROM STDIN`.
    PostgresCopy,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Sql => "sql",
            Backend::PostgresCopy => "postgres_copy",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sql" => Ok(Backend::Sql),
            "postgres_copy" | "copy" => Ok(Backend::PostgresCopy),
            other => Err(FixtureError::Configuration(format!("unknown backend: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Double,
    Decimal { precision: u32, scale: u32 },
    Varchar { length: u32 },
    Text,
    Date,
    Timestamp,
    Uuid,
}

impl ColumnType {
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::Decimal { precision, scale } => format!("DECIMAL({precision}, {scale})"),
            ColumnType::Varchar { length } => format!("VARCHAR({length})"),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Uuid => "UUID".to_string(),
        }
    }

    /// Converts a JSON cell into a value of this type.
    pub fn value_from_json(&self, json: &serde_json::Value) -> std::result::Result<Value, String> {
        use serde_json::Value as Json;

        if json.is_null() {
            return Ok(Value::Null);
        }
        match (self, json) {
            (ColumnType::Boolean, Json::Bool(b)) => Ok(Value::Bool(*b)),
            (ColumnType::SmallInt, Json::Number(n)) => integer_in_range(n, i64::from(i16::MIN), i64::from(i16::MAX)),
            (ColumnType::Integer, Json::Number(n)) => integer_in_range(n, i64::from(i32::MIN), i64::from(i32::MAX)),
            (ColumnType::BigInt, Json::Number(n)) => integer_in_range(n, i64::MIN, i64::MAX),
            (ColumnType::Double, Json::Number(n)) => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| format!("{n} is not a double")),
            (ColumnType::Decimal { .. }, Json::Number(n)) => parse_decimal(&n.to_string()),
            (ColumnType::Decimal { .. }, Json::String(s)) => parse_decimal(s),
            (ColumnType::Varchar { length }, Json::String(s)) => {
                if s.chars().count() > *length as usize {
                    Err(format!("'{s}' is longer than {length} characters"))
                } else {
                    Ok(Value::Text(s.clone()))
                }
            }
            (ColumnType::Text, Json::String(s)) => Ok(Value::Text(s.clone())),
            (ColumnType::Date, Json::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|e| format!("'{s}' is not a date: {e}")),
            (ColumnType::Timestamp, Json::String(s)) => parse_timestamp(s),
            (ColumnType::Uuid, Json::String(s)) => Uuid::parse_str(s)
                .map(Value::Uuid)
                .map_err(|e| format!("'{s}' is not a uuid: {e}")),
            (column_type, other) => Err(format!("{other} does not fit column type {}", column_type.sql_type())),
        }
    }
}

fn integer_in_range(n: &serde_json::Number, min: i64, max: i64) -> std::result::Result<Value, String> {
    match n.as_i64() {
        Some(v) if v >= min && v <= max => Ok(Value::Int(v)),
        _ => Err(format!("{n} is out of range [{min}, {max}]")),
    }
}

fn parse_decimal(text: &str) -> std::result::Result<Value, String> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map(Value::Decimal)
        .map_err(|e| format!("'{text}' is not a decimal: {e}"))
}

fn parse_timestamp(text: &str) -> std::result::Result<Value, String> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(Value::Timestamp)
        .map_err(|e| format!("'{text}' is not a timestamp: {e}"))
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(flatten)]
    pub column_type: ColumnType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    fn ddl(&self) -> String {
        if self.nullable {
            format!("{} {}", self.name, self.column_type.sql_type())
        } else {
            format!("{} {} NOT NULL", self.name, self.column_type.sql_type())
        }
    }
}

/// Immutable description of a fixture table.
#[derive(Clone)]
pub struct TableDefinition {
    name: String,
    backend: Backend,
    columns: Vec<Column>,
    data: Option<Arc<dyn TableDataSource>>,
}

impl TableDefinition {
    pub fn builder(name: impl Into<String>) -> TableDefinitionBuilder {
        TableDefinitionBuilder {
            name: name.into(),
            backend: Backend::default(),
            columns: Vec::new(),
            data: None,
        }
    }

    /// The name hint: used as-is for immutable tables, as the base of
    /// generated names for mutable ones.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn data(&self) -> Option<&dyn TableDataSource> {
        self.data.as_deref()
    }

    pub fn create_table_sql(&self, name_in_database: &str) -> String {
        let columns: Vec<String> = self.columns.iter().map(Column::ddl).collect();
        format!("CREATE TABLE {} ({})", name_in_database, columns.join(", "))
    }

    /// Rejects rows with the wrong arity or a NULL in a NOT NULL column.
    pub fn check_row(&self, index: usize, row: &Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(FixtureError::invalid_definition(
                &self.name,
                format!("row {index} has {} values, expected {}", row.len(), self.columns.len()),
            ));
        }
        for (column, value) in self.columns.iter().zip(row) {
            if !column.nullable && value.is_null() {
                return Err(FixtureError::invalid_definition(
                    &self.name,
                    format!("row {index} has NULL in NOT NULL column {}", column.name),
                ));
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: DefinitionFile = serde_json::from_str(json)?;
        file.into_definition()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

impl fmt::Debug for TableDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableDefinition")
            .field("name", &self.name)
            .field("backend", &self.backend)
            .field("columns", &self.columns)
            .field("rows", &self.data.as_ref().and_then(|d| d.row_count_hint()))
            .finish()
    }
}

pub struct TableDefinitionBuilder {
    name: String,
    backend: Backend,
    columns: Vec<Column>,
    data: Option<Arc<dyn TableDataSource>>,
}

impl TableDefinitionBuilder {
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(Column::new(name, column_type).not_null());
        self
    }

    pub fn nullable_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(Column::new(name, column_type));
        self
    }

    pub fn columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns.extend(columns);
        self
    }

    pub fn rows(mut self, rows: Vec<Row>) -> Self {
        self.data = Some(Arc::new(InlineRows::new(rows)));
        self
    }

    pub fn generated_rows<F>(mut self, count: usize, generator: F) -> Self
    where
        F: Fn(usize) -> Row + Send + Sync + 'static,
    {
        self.data = Some(Arc::new(GeneratedRows::new(count, generator)));
        self
    }

    pub fn data_source(mut self, source: Arc<dyn TableDataSource>) -> Self {
        self.data = Some(source);
        self
    }

    /// Validates the definition. Inline rows are checked here; generated rows
    /// are checked as they are loaded.
    pub fn build(self) -> Result<TableDefinition> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(FixtureError::invalid_definition("<unnamed>", "table name is empty"));
        }
        if self.columns.is_empty() {
            return Err(FixtureError::invalid_definition(&name, "no columns"));
        }
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.trim().is_empty() {
                return Err(FixtureError::invalid_definition(&name, "column name is empty"));
            }
            if !seen.insert(column.name.to_ascii_lowercase()) {
                return Err(FixtureError::invalid_definition(
                    &name,
                    format!("duplicate column {}", column.name),
                ));
            }
        }

        let definition = TableDefinition {
            name,
            backend: self.backend,
            columns: self.columns,
            data: self.data,
        };
        if let Some(source) = &definition.data {
            if source.row_count_hint().is_some_and(|n| n <= INLINE_CHECK_LIMIT) {
                for (index, row) in source.rows().enumerate() {
                    definition.check_row(index, &row)?;
                }
            }
        }
        Ok(definition)
    }
}

// Larger sources are validated while loading instead of twice.
const INLINE_CHECK_LIMIT: usize = 10_000;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DefinitionFile {
    name: String,
    #[serde(default)]
    backend: Backend,
    columns: Vec<Column>,
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

impl DefinitionFile {
    fn into_definition(self) -> Result<TableDefinition> {
        let mut rows = Vec::with_capacity(self.rows.len());
        for (index, cells) in self.rows.iter().enumerate() {
            if cells.len() != self.columns.len() {
                return Err(FixtureError::invalid_definition(
                    &self.name,
                    format!("row {index} has {} values, expected {}", cells.len(), self.columns.len()),
                ));
            }
            let row = self
                .columns
                .iter()
                .zip(cells)
                .map(|(column, cell)| {
                    column.column_type.value_from_json(cell).map_err(|reason| {
                        FixtureError::invalid_definition(
                            &self.name,
                            format!("row {index}, column {}: {reason}", column.name),
                        )
                    })
                })
                .collect::<Result<Row>>()?;
            rows.push(row);
        }

        let mut builder = TableDefinition::builder(self.name)
            .backend(self.backend)
            .columns(self.columns);
        if !rows.is_empty() {
            builder = builder.rows(rows);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nation() -> TableDefinition {
        TableDefinition::builder("nation")
            .column("n_nationkey", ColumnType::BigInt)
            .column("n_name", ColumnType::Varchar { length: 25 })
            .nullable_column("n_comment", ColumnType::Text)
            .rows(vec![
                vec![Value::Int(0), Value::from("ALGERIA"), Value::Null],
                vec![Value::Int(1), Value::from("ARGENTINA"), Value::from("al foxes")],
            ])
            .build()
            .unwrap()
    }

    #[test]
    fn create_table_sql_lists_columns() {
        assert_eq!(
            nation().create_table_sql("tpch.nation"),
            "CREATE TABLE tpch.nation (n_nationkey BIGINT NOT NULL, n_name VARCHAR(25) NOT NULL, n_comment TEXT)"
        );
    }

    #[test]
    fn build_rejects_duplicate_columns() {
        let err = TableDefinition::builder("t")
            .column("id", ColumnType::Integer)
            .column("ID", ColumnType::Text)
            .build()
            .unwrap_err();
        assert!(matches!(err, FixtureError::InvalidDefinition { .. }));
    }

    #[test]
    fn build_rejects_empty_name_and_no_columns() {
        assert!(TableDefinition::builder("  ").column("a", ColumnType::Integer).build().is_err());
        assert!(TableDefinition::builder("t").build().is_err());
    }

    #[test]
    fn build_rejects_null_in_not_null_column() {
        let err = TableDefinition::builder("t")
            .column("id", ColumnType::Integer)
            .rows(vec![vec![Value::Null]])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("NOT NULL"));
    }

    #[test]
    fn backend_parses_from_str() {
        assert_eq!("SQL".parse::<Backend>().unwrap(), Backend::Sql);
        assert_eq!("postgres_copy".parse::<Backend>().unwrap(), Backend::PostgresCopy);
        assert!("hive".parse::<Backend>().is_err());
    }

    #[test]
    fn json_cells_follow_column_type() {
        let decimal = ColumnType::Decimal { precision: 10, scale: 2 };
        assert_eq!(
            decimal.value_from_json(&serde_json::json!("79.99")).unwrap(),
            Value::Decimal(Decimal::new(7999, 2))
        );
        assert!(ColumnType::SmallInt.value_from_json(&serde_json::json!(70000)).is_err());
        assert!(ColumnType::Varchar { length: 2 }.value_from_json(&serde_json::json!("abc")).is_err());
        assert_eq!(ColumnType::Text.value_from_json(&serde_json::Value::Null).unwrap(), Value::Null);
        assert!(ColumnType::Boolean.value_from_json(&serde_json::json!("yes")).is_err());
    }
}
