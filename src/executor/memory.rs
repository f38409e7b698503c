// executor/memory.rs - An in-process stand-in for a database
//
// Understands just enough SQL to follow fixture lifecycles: CREATE TABLE,
// DROP TABLE, INSERT INTO and COPY. Every other statement is recorded and
// succeeds. Clones share state, so a test can hand one clone to a manager
// and inspect the catalog through another.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{CatalogError, QueryExecutionError};
use crate::executor::{BulkLoader, QueryExecutor, TableCursor, TableDescriptor};

#[derive(Debug)]
struct MemoryTable {
    schema: Option<String>,
    name: String,
    rows: u64,
}

#[derive(Debug, Default)]
struct MemoryDatabase {
    // keyed by lowercased, possibly schema-qualified name
    tables: BTreeMap<String, MemoryTable>,
    statements: Vec<String>,
    failing_drops: HashMap<String, String>,
    catalog_failure: Option<String>,
    catalog_failure_after: Option<(usize, String)>,
}

#[derive(Debug, Clone)]
pub struct InMemoryQueryExecutor {
    database: String,
    state: Arc<Mutex<MemoryDatabase>>,
    open_cursors: Arc<AtomicUsize>,
}

impl InMemoryQueryExecutor {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            state: Arc::new(Mutex::new(MemoryDatabase::default())),
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Seeds empty tables, as if another process had created them.
    pub fn with_tables<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        {
            let mut state = self.lock();
            for name in names {
                let (schema, table) = split_qualified(name.as_ref());
                state.tables.insert(
                    name.as_ref().to_ascii_lowercase(),
                    MemoryTable {
                        schema,
                        name: table,
                        rows: 0,
                    },
                );
            }
        }
        self
    }

    /// Names of existing tables (schema-qualified where created that way), sorted.
    pub fn table_names(&self) -> Vec<String> {
        self.lock()
            .tables
            .values()
            .map(|t| match &t.schema {
                Some(schema) => format!("{schema}.{}", t.name),
                None => t.name.clone(),
            })
            .collect()
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.lock().tables.contains_key(&name.to_ascii_lowercase())
    }

    pub fn row_count(&self, name: &str) -> Option<u64> {
        self.lock().tables.get(&name.to_ascii_lowercase()).map(|t| t.rows)
    }

    /// Every statement received so far, in order, including failed ones.
    pub fn statements(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    /// Makes every `DROP TABLE name` fail with `message`.
    pub fn fail_drop(&self, name: &str, message: impl Into<String>) {
        self.lock().failing_drops.insert(name.to_ascii_lowercase(), message.into());
    }

    /// Makes `list_tables` fail before returning a cursor.
    pub fn fail_catalog(&self, message: impl Into<String>) {
        self.lock().catalog_failure = Some(message.into());
    }

    /// Makes the next cursors fail after yielding `rows` descriptors.
    pub fn fail_catalog_after(&self, rows: usize, message: impl Into<String>) {
        self.lock().catalog_failure_after = Some((rows, message.into()));
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failing_drops.clear();
        state.catalog_failure = None;
        state.catalog_failure_after = None;
    }

    /// Cursors handed out by `list_tables` and not yet dropped.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryDatabase> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn error(sql: &str, message: impl Into<String>) -> QueryExecutionError {
        QueryExecutionError::new(sql, message)
    }
}

impl QueryExecutor for InMemoryQueryExecutor {
    fn database_name(&self) -> &str {
        &self.database
    }

    fn execute(&mut self, sql: &str) -> Result<(), QueryExecutionError> {
        let mut state = self.lock();
        state.statements.push(sql.to_string());

        let statement = Statement::parse(sql);
        match statement {
            Statement::CreateTable(name) => {
                let key = name.to_ascii_lowercase();
                if state.tables.contains_key(&key) {
                    return Err(Self::error(sql, format!("table {name} already exists")));
                }
                let (schema, table) = split_qualified(&name);
                state.tables.insert(
                    key,
                    MemoryTable {
                        schema,
                        name: table,
                        rows: 0,
                    },
                );
                Ok(())
            }
            Statement::DropTable { name, if_exists } => {
                let key = name.to_ascii_lowercase();
                if let Some(message) = state.failing_drops.get(&key) {
                    return Err(Self::error(sql, message.clone()));
                }
                if state.tables.remove(&key).is_none() && !if_exists {
                    return Err(Self::error(sql, format!("table {name} does not exist")));
                }
                Ok(())
            }
            Statement::Insert { name, rows } => match state.tables.get_mut(&name.to_ascii_lowercase()) {
                Some(table) => {
                    table.rows += rows;
                    Ok(())
                }
                None => Err(Self::error(sql, format!("table {name} does not exist"))),
            },
            Statement::Copy(_) => Err(Self::error(sql, "COPY FROM STDIN requires copy_in")),
            Statement::Other => Ok(()),
        }
    }

    fn list_tables(&mut self) -> Result<TableCursor, CatalogError> {
        let state = self.lock();
        if let Some(message) = &state.catalog_failure {
            return Err(CatalogError::Enumeration {
                database: self.database.clone(),
                message: message.clone(),
            });
        }

        let mut rows: Vec<Result<TableDescriptor, CatalogError>> = state
            .tables
            .values()
            .map(|t| {
                Ok(TableDescriptor {
                    catalog: Some(self.database.clone()),
                    schema: t.schema.clone(),
                    name: Some(t.name.clone()),
                    table_type: Some("TABLE".to_string()),
                })
            })
            .collect();
        if let Some((after, message)) = &state.catalog_failure_after {
            rows.truncate(*after);
            rows.push(Err(CatalogError::Enumeration {
                database: self.database.clone(),
                message: message.clone(),
            }));
        }

        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        Ok(TableCursor::new(TrackedRows {
            rows: rows.into_iter(),
            open_cursors: Arc::clone(&self.open_cursors),
        }))
    }
}

impl BulkLoader for InMemoryQueryExecutor {
    fn copy_in(&mut self, statement: &str, payload: &[u8]) -> Result<u64, QueryExecutionError> {
        let mut state = self.lock();
        state.statements.push(statement.to_string());

        let Statement::Copy(name) = Statement::parse(statement) else {
            return Err(Self::error(statement, "not a COPY ... FROM STDIN statement"));
        };
        let rows = payload.iter().filter(|b| **b == b'\n').count() as u64;
        match state.tables.get_mut(&name.to_ascii_lowercase()) {
            Some(table) => {
                table.rows += rows;
                Ok(rows)
            }
            None => Err(Self::error(statement, format!("table {name} does not exist"))),
        }
    }
}

struct TrackedRows {
    rows: std::vec::IntoIter<Result<TableDescriptor, CatalogError>>,
    open_cursors: Arc<AtomicUsize>,
}

impl Iterator for TrackedRows {
    type Item = Result<TableDescriptor, CatalogError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }
}

impl Drop for TrackedRows {
    fn drop(&mut self) {
        self.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }
}

enum Statement {
    CreateTable(String),
    DropTable { name: String, if_exists: bool },
    Insert { name: String, rows: u64 },
    Copy(String),
    Other,
}

impl Statement {
    fn parse(sql: &str) -> Self {
        let tokens: Vec<&str> = sql.split_whitespace().collect();
        let keyword = |i: usize| tokens.get(i).map(|t| t.to_ascii_uppercase()).unwrap_or_default();

        match (keyword(0).as_str(), keyword(1).as_str()) {
            ("CREATE", "TABLE") => match tokens.get(2) {
                Some(name) => Statement::CreateTable(table_token(name)),
                None => Statement::Other,
            },
            ("DROP", "TABLE") => {
                let if_exists = keyword(2) == "IF" && keyword(3) == "EXISTS";
                let index = if if_exists { 4 } else { 2 };
                match tokens.get(index) {
                    Some(name) => Statement::DropTable {
                        name: table_token(name),
                        if_exists,
                    },
                    None => Statement::Other,
                }
            }
            ("INSERT", "INTO") => match tokens.get(2) {
                Some(name) => Statement::Insert {
                    name: table_token(name),
                    rows: count_value_tuples(sql),
                },
                None => Statement::Other,
            },
            ("COPY", _) => match tokens.get(1) {
                Some(name) => Statement::Copy(table_token(name)),
                None => Statement::Other,
            },
            _ => Statement::Other,
        }
    }
}

// Quoted identifiers lose their quotes; names compare case-insensitively anyway.
fn table_token(token: &str) -> String {
    token
        .split('(')
        .next()
        .unwrap_or_default()
        .trim_end_matches(';')
        .replace('"', "")
}

fn split_qualified(name: &str) -> (Option<String>, String) {
    match name.rsplit_once('.') {
        Some((schema, table)) => (Some(schema.to_string()), table.to_string()),
        None => (None, name.to_string()),
    }
}

// Counts top-level parenthesized tuples after VALUES, skipping quoted text.
fn count_value_tuples(sql: &str) -> u64 {
    let upper = sql.to_ascii_uppercase();
    let Some(start) = upper.find(" VALUES") else {
        return 0;
    };

    let mut tuples = 0;
    let mut depth = 0_u32;
    let mut in_quote = false;
    for c in sql[start..].chars() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => {
                if depth == 0 {
                    tuples += 1;
                }
                depth += 1;
            }
            ')' if !in_quote => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    tuples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_insert_drop() {
        let mut executor = InMemoryQueryExecutor::new("memory");
        executor.execute("CREATE TABLE t (id INTEGER)").unwrap();
        executor
            .execute("INSERT INTO t (id, name) VALUES (1, 'a (x)'), (2, 'it''s')")
            .unwrap();
        assert_eq!(executor.row_count("t"), Some(2));

        executor.execute("DROP TABLE t").unwrap();
        assert!(!executor.contains_table("t"));
        assert!(executor.execute("DROP TABLE t").is_err());
        executor.execute("DROP TABLE IF EXISTS t").unwrap();
    }

    #[test]
    fn create_twice_fails() {
        let mut executor = InMemoryQueryExecutor::new("memory");
        executor.execute("CREATE TABLE s.t (id INTEGER)").unwrap();
        let err = executor.execute("CREATE TABLE S.T (id INTEGER)").unwrap_err();
        assert!(err.message.contains("already exists"));
        assert_eq!(executor.table_names(), vec!["s.t"]);
    }

    #[test]
    fn cursor_release_is_tracked() {
        let mut executor = InMemoryQueryExecutor::new("memory").with_tables(["a", "b"]);
        let cursor = executor.list_tables().unwrap();
        assert_eq!(executor.open_cursors(), 1);
        drop(cursor);
        assert_eq!(executor.open_cursors(), 0);
    }

    #[test]
    fn catalog_failure_mid_stream() {
        let mut executor = InMemoryQueryExecutor::new("memory").with_tables(["a", "b", "c"]);
        executor.fail_catalog_after(1, "connection reset");
        let rows: Vec<_> = executor.list_tables().unwrap().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_ok());
        assert!(rows[1].is_err());
    }

    #[test]
    fn copy_counts_payload_lines() {
        let mut executor = InMemoryQueryExecutor::new("memory").with_tables(["t"]);
        let loaded = executor.copy_in("COPY t (a, b) FROM STDIN", b"1\tx\n2\ty\n").unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(executor.row_count("t"), Some(2));
        assert!(executor.execute("COPY t FROM STDIN").is_err());
    }
}
