// Drops every mutable fixture table left behind in the configured databases.
//
// Without --config the configuration comes from DATABASE_URL and the
// FIXTURE_* environment variables (a .env file is honored).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use table_fixtures::{bootstrap, logging, FixtureConfig};

#[derive(Parser, Debug)]
#[command(name = "fixture_sweep")]
#[command(about = "Drop mutable fixture tables left behind by earlier test runs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the sweep reports as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    logging::init_logging();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => FixtureConfig::from_json_file(path)?,
        None => FixtureConfig::from_env()?,
    };
    // the sweep below is the whole point; don't run it twice
    config.sweep_on_startup = false;

    let mut dispatcher = bootstrap::connect(&config).context("failed to connect to fixture databases")?;
    let reports = dispatcher
        .drop_all_mutable_tables()
        .context("mutable table sweep failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }
    for report in &reports {
        println!(
            "{}: examined {} tables, dropped {}, failed {}",
            report.database,
            report.examined,
            report.dropped.len(),
            report.failures.len()
        );
        for failure in &report.failures {
            println!("  ✗ {}: {}", failure.table, failure.reason);
        }
    }
    Ok(())
}
