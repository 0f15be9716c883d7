//! Structured logging setup.
//!
//! Installs a `tracing-subscriber` fmt subscriber built from
//! [`LoggingConfig`]. `RUST_LOG` takes precedence over the configured level.

use crate::config::LoggingConfig;
use crate::error::constants::{ERR_LOGGING_INIT, ERR_LOG_FILE_MISSING};
use crate::error::{BufferError, Result};
use std::fs::{File, OpenOptions};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let default_level = config.log_level.as_str().to_ascii_lowercase();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default_level))
        .unwrap_or_else(|_| EnvFilter::new(&default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(make_writer(config)?);

    let installed = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| BufferError::Custom(format!("{ERR_LOGGING_INIT}: {e}")))?;

    info!(app = %config.app_name, level = %config.log_level, "Logging initialized");
    Ok(())
}

fn make_writer(config: &LoggingConfig) -> Result<BoxMakeWriter> {
    let file = if config.log_to_file {
        let path = config
            .log_file_path
            .as_deref()
            .ok_or_else(|| BufferError::ConfigError(ERR_LOG_FILE_MISSING.to_string()))?;
        Some(open_log_file(path)?)
    } else {
        None
    };

    let writer = match (config.log_to_console, file) {
        (true, Some(file)) => BoxMakeWriter::new(std::io::stderr.and(Mutex::new(file))),
        (false, Some(file)) => BoxMakeWriter::new(Mutex::new(file)),
        (_, None) => BoxMakeWriter::new(std::io::stderr),
    };
    Ok(writer)
}

fn open_log_file(path: &str) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}
