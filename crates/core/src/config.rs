//! Application configuration.
//!
//! Settings are read from `<config_dir>/routeplan/config.toml` and may be
//! overridden with `ROUTEPLAN_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory under the user's config dir owned by this application.
pub const APP_DIR: &str = "routeplan";

const DEFAULT_CONFIG: &str = r#"# Route planner configuration.

# Directory holding the stored route and last search.
# storage_root = "/home/me/.config/routeplan/storage"

# Simulated catalog fetch latency in milliseconds.
fetch_delay_ms = 800

# Probability (0.0 - 1.0) that a simulated fetch fails.
fetch_failure_rate = 0.0

# Seconds a status notification stays visible.
notice_ttl_secs = 3

# City searched when the city field is left blank.
default_city = "Moscow"

# Log level used when RUST_LOG is not set.
log_level = "info"
"#;

/// Runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Root directory of the key-value store.
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,
    /// Simulated fetch delay.
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,
    /// Chance of a simulated fetch failure.
    #[serde(default)]
    pub fetch_failure_rate: f64,
    /// Notification lifetime.
    #[serde(default = "default_notice_ttl_secs")]
    pub notice_ttl_secs: u64,
    /// City used for blank searches.
    #[serde(default = "default_city")]
    pub default_city: String,
    /// Fallback tracing filter.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_root: default_storage_root(),
            fetch_delay_ms: default_fetch_delay_ms(),
            fetch_failure_rate: 0.0,
            notice_ttl_secs: default_notice_ttl_secs(),
            default_city: default_city(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load from the default config file and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from an explicit file (missing files are ignored) and environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(
                File::from(path.to_path_buf())
                    .required(false)
                    .format(FileFormat::Toml),
            )
            .add_source(Environment::with_prefix("ROUTEPLAN").try_parsing(true))
            .build()
            .with_context(|| format!("failed to build configuration from {}", path.display()))?;

        let config: Self = settings
            .try_deserialize()
            .context("failed to deserialize configuration")?;
        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        self.fetch_failure_rate = self.fetch_failure_rate.clamp(0.0, 1.0);
        if self.default_city.trim().is_empty() {
            self.default_city = default_city();
        }
        self
    }
}

/// Root directory for configuration and data.
pub fn config_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Location of the configuration file.
pub fn config_path() -> PathBuf {
    config_root().join("config.toml")
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    ensure_default_config_at(config_path())
}

/// Write a commented default config file at `path` if it does not exist.
pub fn ensure_default_config_at(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

fn default_storage_root() -> PathBuf {
    config_root().join("storage")
}

fn default_fetch_delay_ms() -> u64 {
    800
}

fn default_notice_ttl_secs() -> u64 {
    3
}

fn default_city() -> String {
    "Moscow".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
