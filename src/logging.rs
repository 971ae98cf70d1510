//! Logging setup.
//!
//! Logs go to stderr by default, or to a file (without ANSI colours) when a
//! log file is configured. `RUST_LOG` selects the filter, defaulting to `info`.

use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use crate::error::{InventoryError, Result};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to the given file, appending to it.
pub fn init_file_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            InventoryError::config(format!(
                "Could not create log directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            InventoryError::config(format!("Could not open log file {}: {e}", path.display()))
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .init();
    Ok(())
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Initializes logging according to the configured destination.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    match log_file {
        Some(path) => init_file_logging(path),
        None => {
            init_stderr_logging();
            Ok(())
        }
    }
}
