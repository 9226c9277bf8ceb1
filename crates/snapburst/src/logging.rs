//! Tracing setup: human-readable output on stderr plus a daily JSON log file
//! under the application data directory.

use crate::config::project_dirs;

use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "snapburst=debug,snapburst_core=debug";
const LOG_FILE_PREFIX: &str = "snapburst.log";

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default filter. The returned guard flushes the
/// file writer on drop and must live as long as the process; `None` means
/// only stderr logging is active.
pub fn init() -> Option<WorkerGuard> {
    let filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let log_dir = project_dirs().map(|dirs| dirs.data_dir().join("logs"));
    let file = log_dir.as_ref().map(|dir| {
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX))
    });

    match file {
        Some((writer, guard)) => {
            tracing_subscriber::registry()
                .with(filter())
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(fmt::layer().json().with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter())
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
            warn!("No data directory, logging to stderr only");
            None
        }
    }
}
