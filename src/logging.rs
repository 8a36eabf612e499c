use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{IngestError, Result};

/// Install the global subscriber: human-readable lines on stderr plus JSON
/// lines in a daily-rotated file under `config.directory`.
///
/// `RUST_LOG` overrides `config.default_filter`. Keep the returned guard
/// alive until exit or buffered file output is lost.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.directory)?;

    let appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.default_filter).map_err(|e| {
            IngestError::Config(format!(
                "invalid log filter '{}': {}",
                config.default_filter, e
            ))
        })?,
    };

    let json_file = fmt::layer()
        .json()
        .with_current_span(true)
        .with_writer(writer);
    let console = fmt::layer().with_target(false).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(json_file)
        .with(console)
        .try_init()
        .map_err(|e| IngestError::Config(format!("logging already initialised: {}", e)))?;

    Ok(guard)
}
