// src/logging.rs
use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Routes tracing output to the configured file; the terminal belongs to the
/// dashboard. `RUST_LOG` wins over the configured level.
pub fn init(cfg: &LoggingConfig) -> anyhow::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(&cfg.file)?;
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cfg.level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))?;
    Ok(())
}
