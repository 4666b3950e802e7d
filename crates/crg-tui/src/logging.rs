use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use anyhow::{Result, anyhow};
use crg_core::Config;
use tracing_subscriber::EnvFilter;

/// Route tracing output to `<config_dir>/crg/crg.log`; the terminal belongs to the UI.
pub fn init() -> Result<PathBuf> {
    let dir = Config::config_dir()?;
    fs::create_dir_all(&dir)?;
    let path = dir.join("crg.log");

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {}", e))?;

    Ok(path)
}
