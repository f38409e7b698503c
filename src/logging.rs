// logging.rs - tracing subscriber setup for binaries and test suites

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Installs a fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once and from tests: later calls do nothing, and a
/// subscriber installed by someone else is left in place.
pub fn init_logging() {
    LOGGING_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let result = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .try_init();
        if result.is_err() {
            tracing::debug!("global tracing subscriber already installed");
        }
    });
}
