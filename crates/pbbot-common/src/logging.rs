//! Structured logging infrastructure for PB Bot

use crate::error::{PbBotError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Configuration for the logging system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "pbbot_cache=debug")
    pub level: String,
    /// Whether to emit JSON lines on stdout
    pub json_format: bool,
    /// Whether to include target module information
    pub include_targets: bool,
    /// Directory for daily rolling log files, if any
    pub directory: Option<PathBuf>,
    /// File name prefix for rolling log files
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_targets: true,
            directory: None,
            file_prefix: "pbbot.log".to_string(),
        }
    }
}

/// Initialize the tracing subscriber with the given configuration.
///
/// When a log directory is configured the returned guard must be kept alive
/// for as long as file logging is wanted; dropping it flushes and stops the
/// background writer.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| PbBotError::logging(format!("invalid filter `{}`: {e}", config.level)))?;

    let stdout_layer = if config.json_format {
        fmt::layer()
            .json()
            .with_target(config.include_targets)
            .boxed()
    } else {
        fmt::layer().with_target(config.include_targets).boxed()
    };

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(config.include_targets)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| PbBotError::logging(e.to_string()))?;

    Ok(guard)
}
