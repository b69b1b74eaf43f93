use crate::config::Settings;
use crate::constants::{APP_DIR, LOG_ENV, LOG_FILE};
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

fn log_path(settings: &Settings) -> PathBuf {
    settings.log_file.clone().unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(env::temp_dir)
            .join(APP_DIR)
            .join(LOG_FILE)
    })
}

/// Sends tracing output to a log file; the terminal belongs to the UI.
/// Keep the returned guard alive until exit so buffered lines get flushed.
pub fn init_logger(settings: &Settings) -> Result<WorkerGuard> {
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::try_new(&filter)
        .with_context(|| format!("Invalid {LOG_ENV} filter '{filter}'"))?;

    let path = log_path(settings);
    let dir = path.parent().map(PathBuf::from).unwrap_or_default();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file_name = path.file_name().map_or_else(|| LOG_FILE.into(), ToOwned::to_owned);

    let file_appender = tracing_appender::rolling::never(&dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter_layer)
        .try_init()
        .context("Tracing subscriber already installed")?;

    info!("Logging to {}", path.display());
    Ok(guard)
}
