mod app;
mod drag;

use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
    time::Duration,
};

use anyhow::{Context, Result};
use routeplan_core::{
    config::{self, AppConfig},
    CatalogSource, FileStore, Persistence, Planner,
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;

    tracing::info!(storage = %config.storage_root.display(), "Starting route planner");
    let store = FileStore::new(&config.storage_root);
    let planner = Planner::new(Persistence::new(store));
    let source = CatalogSource::from_config(&config);

    let mut app = app::PlannerApp::new(
        planner,
        source,
        Duration::from_secs(config.notice_ttl_secs),
    );
    app.run().await
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("routeplan.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // The terminal UI owns stdout, so logs only go to the file.
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
