//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log filter:
//! 1. `--verbose` CLI flag (debug for this crate)
//! 2. `TASKDAG_LOG` environment variable (e.g. "info", "taskdag=trace")
//! 3. default to `warn`
//!
//! Logs go to stderr so JSON output on stdout stays machine-readable.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter directive
pub const LOG_ENV: &str = "TASKDAG_LOG";

/// Initialise the global logging subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(verbose: bool) -> Result<()> {
    let directive = directive_for(verbose, std::env::var(LOG_ENV).ok().as_deref());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid {} filter: {}", LOG_ENV, directive))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();

    Ok(())
}

fn directive_for(verbose: bool, env: Option<&str>) -> String {
    if verbose {
        return "taskdag=debug".to_string();
    }
    env.map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("warn")
        .to_string()
}
