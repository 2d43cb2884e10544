//! Logging and tracing configuration
//!
//! The CLI logs to stderr and, when a data directory is available, appends
//! a detailed copy of every event to `runner.log`.

use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::paths;

const LOG_FILE_NAME: &str = "runner.log";

/// Initialize tracing for the CLI
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate (DEBUG with `verbose`), WARN for
/// dependencies. Returns the log file path when file logging is active.
pub fn init_cli(verbose: bool) -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("uicd_runner=debug,warn")
        } else {
            EnvFilter::new("uicd_runner=info,warn")
        }
    });

    let log_dir = match paths::ensure_log_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Warning: Could not create log directory: {}", e);
            None
        }
    };

    subscriber(filter, log_dir.as_deref()).init();

    log_dir.map(|d| d.join(LOG_FILE_NAME))
}

/// Compact stderr output, plus a detailed file copy when `log_dir` is given
fn subscriber(
    filter: EnvFilter,
    log_dir: Option<&Path>,
) -> impl tracing::Subscriber + Send + Sync + 'static {
    let file_layer = log_dir.map(|log_dir| {
        fmt::layer()
            .with_writer(tracing_appender::rolling::never(log_dir, LOG_FILE_NAME))
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
}

/// Get the path to the runner log file
pub fn log_path() -> Option<PathBuf> {
    paths::log_dir().map(|d| d.join(LOG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_events_reach_log_file() {
        let dir = tempdir().unwrap();

        tracing::subscriber::with_default(
            subscriber(EnvFilter::new("info"), Some(dir.path())),
            || tracing::info!("case finished"),
        );

        let logged = std::fs::read_to_string(dir.path().join(LOG_FILE_NAME)).unwrap();
        assert!(logged.contains("case finished"), "log file: {}", logged);
    }
}
