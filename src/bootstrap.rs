// bootstrap.rs - Connected dispatcher from configuration
//
// One blocking PostgreSQL connection per configured database, wrapped in the
// table manager for that database's backend.

use crate::config::FixtureConfig;
use crate::dispatcher::TableManagerDispatcher;
use crate::error::Result;
use crate::executor::PostgresQueryExecutor;
use crate::fixtures::Backend;
use crate::manager::{CopyTableManager, SqlTableManager};

pub fn connect(config: &FixtureConfig) -> Result<TableManagerDispatcher> {
    config.validate()?;
    let naming = config.name_generator()?;

    let mut dispatcher = TableManagerDispatcher::new();
    for database in &config.databases {
        let executor = PostgresQueryExecutor::connect(&database.name, &database.url)?;
        match database.backend {
            Backend::Sql => dispatcher.register(
                SqlTableManager::new(executor, naming.clone()).with_batch_size(config.insert_batch_size),
            )?,
            Backend::PostgresCopy => dispatcher.register(CopyTableManager::new(executor, naming.clone()))?,
        }
        tracing::info!(database = %database.name, backend = %database.backend, "table manager ready");
    }

    if config.sweep_on_startup {
        for report in dispatcher.drop_all_mutable_tables()? {
            if !report.is_clean() {
                tracing::warn!(
                    database = %report.database,
                    failed = report.failures.len(),
                    "startup sweep left mutable tables behind"
                );
            }
        }
    }
    Ok(dispatcher)
}
