use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use crate::error::{HvmError, Result};
use crate::paths::Layout;

/// Environment variable holding an `EnvFilter` directive, e.g. `HVM_LOG=debug`.
pub const LOG_ENV: &str = "HVM_LOG";

/// Installs the process-wide subscriber appending to `~/.hvm/hvm.log`.
///
/// `default_level` is used when `HVM_LOG` is not set. Calling this twice is
/// harmless; the second subscriber is simply not installed.
pub fn init_logging(layout: &Layout, default_level: &str) -> Result<()> {
    let path = layout.log_file();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| HvmError::io(&path, e))?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
    Ok(())
}
