//! Tracing subscriber setup from the `[logging]` section.

use crate::{LogFormat, LoggingConfig};
use relay_error::{ConfigError, RelayResult};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the global subscriber.
///
/// `RUST_LOG` overrides the configured level. With a log file configured,
/// lines are appended there instead of written to stdout.
///
/// # Errors
///
/// Returns an error if the filter is invalid, the log file cannot be opened,
/// or a subscriber is already installed.
pub fn init_telemetry(config: &LoggingConfig) -> RelayResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level()))
        .map_err(|e| ConfigError::new(format!("Invalid log level {}: {}", config.level(), e)))?;

    let fmt_layer = match (config.format(), config.file()) {
        (LogFormat::Json, None) => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .boxed(),
        (LogFormat::Text, None) => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .boxed(),
        (format, Some(path)) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    ConfigError::new(format!("Failed to open log file {}: {}", path.display(), e))
                })?;
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true);
            match format {
                LogFormat::Json => layer.json().boxed(),
                LogFormat::Text => layer.boxed(),
            }
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to install subscriber: {}", e)))?;

    info!(format = %config.format(), "Telemetry initialized");
    Ok(())
}
