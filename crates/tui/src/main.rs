mod app;
mod block_font;
mod locale;

use anyhow::{Context, Result};
use std::{
    fs::{self, File, OpenOptions},
    sync::Mutex,
};

use mdr_core::config::{self, AppConfig};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load_from(&config_path)?;

    let mut app = app::MdrApp::new(config)?;
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("mdr.log");
    let log_file: File = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // the terminal belongs to the UI, so logs only go to the file
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
