// config.rs - Fixture configuration
//
// Loaded from the environment (with `.env` support) or from a JSON file:
//
//   {
//     "databases": [{ "name": "default", "url": "postgres://...", "backend": "sql" }],
//     "mutable_table_prefix": "fixture_mut_",
//     "insert_batch_size": 500,
//     "sweep_on_startup": true
//   }

use std::collections::HashSet;
use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FixtureError, Result};
use crate::fixtures::Backend;
use crate::manager::sql::DEFAULT_INSERT_BATCH_SIZE;
use crate::naming::{TableNameGenerator, MUTABLE_TABLE_PREFIX};

pub const DEFAULT_DATABASE_NAME: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub backend: Backend,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureConfig {
    pub databases: Vec<DatabaseConfig>,
    #[serde(default = "default_prefix")]
    pub mutable_table_prefix: String,
    #[serde(default = "default_batch_size")]
    pub insert_batch_size: usize,
    #[serde(default)]
    pub sweep_on_startup: bool,
}

fn default_prefix() -> String {
    MUTABLE_TABLE_PREFIX.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_INSERT_BATCH_SIZE
}

impl FixtureConfig {
    /// Reads `DATABASE_URL` and the optional `FIXTURE_*` variables, after
    /// loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL")
            .ok_or_else(|| FixtureError::Configuration("DATABASE_URL must be set".to_string()))?;
        let name = lookup("FIXTURE_DATABASE_NAME").unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());
        let backend = match lookup("FIXTURE_BACKEND") {
            Some(value) => value.parse()?,
            None => Backend::default(),
        };
        let insert_batch_size = match lookup("FIXTURE_INSERT_BATCH_SIZE") {
            Some(value) => value.trim().parse().map_err(|_| {
                FixtureError::Configuration(format!("FIXTURE_INSERT_BATCH_SIZE is not a number: {value}"))
            })?,
            None => DEFAULT_INSERT_BATCH_SIZE,
        };
        let sweep_on_startup = match lookup("FIXTURE_SWEEP_ON_STARTUP") {
            Some(value) => parse_flag(&value)?,
            None => false,
        };

        let config = Self {
            databases: vec![DatabaseConfig { name, url, backend }],
            mutable_table_prefix: lookup("FIXTURE_TABLE_PREFIX").unwrap_or_else(default_prefix),
            insert_batch_size,
            sweep_on_startup,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.databases.is_empty() {
            return Err(FixtureError::Configuration("no databases configured".to_string()));
        }
        let mut names = HashSet::new();
        for database in &self.databases {
            if database.name.trim().is_empty() {
                return Err(FixtureError::Configuration("database name is empty".to_string()));
            }
            if database.url.trim().is_empty() {
                return Err(FixtureError::Configuration(format!("database {} has no url", database.name)));
            }
            if !names.insert(database.name.as_str()) {
                return Err(FixtureError::Configuration(format!("database {} is configured twice", database.name)));
            }
        }
        if self.insert_batch_size == 0 {
            return Err(FixtureError::Configuration("insert_batch_size must be positive".to_string()));
        }
        self.name_generator().map(|_| ())
    }

    /// A name generator using the configured prefix.
    pub fn name_generator(&self) -> Result<TableNameGenerator> {
        TableNameGenerator::new().with_prefix(self.mutable_table_prefix.clone())
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(FixtureError::Configuration(format!("not a boolean: {other}"))),
    }
}
