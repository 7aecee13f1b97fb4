mod app;
mod form;

use std::fs::{self, OpenOptions};

use anyhow::{Context, Result};
use fleetyard_core::{
    config::{self, AppConfig},
    HazardLog, Registry,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;
    info!(path = %config_path.display(), "Configuration loaded");

    let hazards = HazardLog::new();
    let registry = Registry::with_config(config.fleet.clone()).with_notifier(hazards.clone());

    let mut app = app::FleetApp::new(
        registry,
        hazards,
        config.product_catalog(),
        config.tick_rate(),
    );
    app.run().await
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_dir = if config.log_dir.is_absolute() {
        config.log_dir.clone()
    } else {
        std::env::current_dir()?.join(&config.log_dir)
    };
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("fleetyard.log");

    // The terminal belongs to the UI, so logs only go to the file.
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(std::sync::Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
