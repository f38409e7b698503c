// manager/sweep.rs - Dropping fixture tables
//
// Shared by every table manager variant through TableManagerExt. Nothing here
// remembers what was created: the sweep re-reads the catalog each time and
// trusts the naming convention.

use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::manager::{DropFailure, DropOutcome, SweepReport};
use crate::naming::TableNameGenerator;

pub(crate) fn drop_table(executor: &mut dyn QueryExecutor, name: &str) -> Result<()> {
    executor.execute(&format!("DROP TABLE {name}"))?;
    tracing::debug!(database = %executor.database_name(), table = %name, "dropped table");
    Ok(())
}

pub(crate) fn drop_table_ignore_error(executor: &mut dyn QueryExecutor, name: &str) -> DropOutcome {
    match drop_table(executor, name) {
        Ok(()) => DropOutcome::Dropped,
        Err(e) => {
            tracing::debug!(
                database = %executor.database_name(),
                table = %name,
                error = %e,
                "unable to drop table"
            );
            DropOutcome::Failed(DropFailure {
                table: name.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Drops every catalog entry the generator classifies as mutable.
///
/// Per-table failures are collected in the report. Failing to open or read
/// the catalog aborts the sweep; the cursor is released either way.
pub(crate) fn drop_all_mutable_tables(
    executor: &mut dyn QueryExecutor,
    naming: &TableNameGenerator,
) -> Result<SweepReport> {
    let mut report = SweepReport::new(executor.database_name());
    let tables = executor.list_tables()?;

    for descriptor in tables {
        let descriptor = descriptor?;
        report.examined += 1;

        let Some(name) = descriptor.name.as_deref() else {
            continue;
        };
        if !naming.is_mutable_table_name(name) {
            continue;
        }
        let target = drop_target(descriptor.schema.as_deref(), name);
        match drop_table_ignore_error(executor, &target) {
            DropOutcome::Dropped => report.dropped.push(target),
            DropOutcome::Failed(failure) => report.failures.push(failure),
        }
    }

    tracing::info!(
        database = %report.database,
        examined = report.examined,
        dropped = report.dropped.len(),
        failed = report.failures.len(),
        "mutable table sweep finished"
    );
    Ok(report)
}

/// The identifier to drop a catalog entry by.
///
/// Names that are not plain lowercase are quoted so the drop reaches the
/// exact table the catalog reported, on case-preserving and upper-folding
/// catalogs alike.
fn drop_target(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(schema) if !schema.is_empty() => format!("{}.{}", quote_identifier(schema), quote_identifier(name)),
        _ => quote_identifier(name),
    }
}

fn quote_identifier(identifier: &str) -> String {
    let plain = identifier.starts_with(|c: char| c.is_ascii_lowercase() || c == '_')
        && identifier
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    if plain {
        identifier.to_string()
    } else {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }
}

/// Whether the catalog lists `name`, in `schema` when one is given.
pub(crate) fn table_exists(executor: &mut dyn QueryExecutor, schema: Option<&str>, name: &str) -> Result<bool> {
    for descriptor in executor.list_tables()? {
        let descriptor = descriptor?;
        let name_matches = descriptor
            .name
            .as_deref()
            .is_some_and(|n| n.eq_ignore_ascii_case(name));
        let schema_matches = match (schema, descriptor.schema.as_deref()) {
            (None, _) => true,
            (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
            (Some(_), None) => false,
        };
        if name_matches && schema_matches {
            return Ok(true);
        }
    }
    Ok(false)
}
