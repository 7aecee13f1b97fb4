//! Application configuration loaded from disk and the environment.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::products::ProductCatalog;

/// Directory under the user's config dir holding `config.json`.
pub const CONFIG_DIR: &str = "fleetyard";
/// Configuration file name.
pub const CONFIG_FILE: &str = "config.json";
/// Prefix of environment variables overriding file settings.
pub const ENV_PREFIX: &str = "FLEETYARD";

/// Registry policy switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Re-check a ship's weight limit when a container aboard is swapped for
    /// another. Disabling this allows a replacement to overload a ship.
    pub revalidate_replacements: bool,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            revalidate_replacements: true,
        }
    }
}

/// Top-level settings shared by the core and its frontends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory receiving log files.
    pub log_dir: PathBuf,
    /// Default tracing filter directive, overridden by `RUST_LOG`.
    pub log_level: String,
    /// Input poll interval of the terminal UI, in milliseconds.
    pub tick_rate_ms: u64,
    /// Registry policy.
    pub fleet: FleetConfig,
    /// Extra or overridden refrigerated products, name to minimum °C.
    pub products: BTreeMap<String, i32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            log_level: "info".to_string(),
            tick_rate_ms: 250,
            fleet: FleetConfig::default(),
            products: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Location of the configuration file inside the user's config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
    }

    /// Load from the default location layered with `FLEETYARD_*` variables.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load from `path` (optional) layered with `FLEETYARD_*` variables.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `FLEETYARD_FLEET__REVALIDATE_REPLACEMENTS=false`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(
                File::from(path)
                    .format(FileFormat::Json)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("failed to parse configuration {}", path.display()))
    }

    /// Poll interval as a [`Duration`], never shorter than 10ms.
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(10))
    }

    /// Built-in product catalog with configured overrides applied.
    pub fn product_catalog(&self) -> ProductCatalog {
        ProductCatalog::with_overrides(&self.products)
    }
}

/// Write a default configuration file unless one already exists.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = AppConfig::default_path();
    ensure_config_at(&path)?;
    Ok(path)
}

/// Write a default configuration file at `path` unless it already exists.
pub fn ensure_config_at(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(&AppConfig::default())
        .context("failed to serialize default configuration")?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write configuration {}", path.display()))?;
    info!(path = %path.display(), "Default configuration written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.json"))?;
        assert!(config.fleet.revalidate_replacements);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.tick_rate(), Duration::from_millis(250));
        Ok(())
    }

    #[test]
    fn default_file_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);
        ensure_config_at(&path)?;
        assert!(path.exists());

        let config = AppConfig::load_from(&path)?;
        assert!(config.fleet.revalidate_replacements);
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        Ok(())
    }

    #[test]
    fn existing_file_is_not_overwritten() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{ "tick_rate_ms": 100, "fleet": { "revalidate_replacements": false } }"#,
        )?;
        ensure_config_at(&path)?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.tick_rate_ms, 100);
        assert!(!config.fleet.revalidate_replacements);
        assert_eq!(config.log_level, "info");
        Ok(())
    }

    #[test]
    fn configured_products_extend_catalog() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "products": { "Caviar": -2 } }"#)?;

        let catalog = AppConfig::load_from(&path)?.product_catalog();
        assert_eq!(catalog.minimum_temperature("caviar"), Some(-2));
        assert_eq!(catalog.minimum_temperature("Fish"), Some(2));
        Ok(())
    }
}
