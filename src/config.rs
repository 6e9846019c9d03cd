//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{APP_NAME, DEFAULT_SYNC_PROVIDER};
use crate::icons::FaviconProvider;

/// Path configuration for file system locations.
///
/// Unset paths resolve to platform defaults under the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PathConfig {
    /// Client-local catalog store (one JSON file per field)
    pub data_dir: Option<PathBuf>,
    /// SQLite database used by the server
    pub database: Option<PathBuf>,
    /// Directory for downloaded favicons
    pub icon_cache: Option<PathBuf>,
}

impl PathConfig {
    /// Resolved data directory.
    ///
    /// - Linux: `~/.local/share/StartDeck/`
    /// - macOS: `~/Library/Application Support/StartDeck/`
    /// - Windows: `%APPDATA%\StartDeck\`
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(dirs::data_dir()
                .context("Failed to determine data directory")?
                .join(APP_NAME)),
        }
    }

    /// Resolved database file.
    pub fn database(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => Ok(self.data_dir()?.join("startdeck.db")),
        }
    }

    /// Resolved favicon cache directory.
    pub fn icon_cache(&self) -> Result<PathBuf> {
        match &self.icon_cache {
            Some(path) => Ok(path.clone()),
            None => Ok(self.data_dir()?.join("icons")),
        }
    }
}

/// Web server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

/// Favicon provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    /// Provider the icon-sync endpoint downloads from
    pub sync_provider: String,
    /// Download timeout in seconds
    pub timeout_secs: u64,
    /// Providers tried in order for automatic icons
    pub providers: Vec<FaviconProvider>,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            sync_provider: DEFAULT_SYNC_PROVIDER.to_string(),
            timeout_secs: 8,
            providers: FaviconProvider::defaults(),
        }
    }
}

impl IconConfig {
    /// Download timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/StartDeck/config.toml`
/// - macOS: `~/Library/Application Support/StartDeck/config.toml`
/// - Windows: `%APPDATA%\StartDeck\config.toml`
///
/// # Validation
///
/// - `server.port` must be non-zero
/// - at least one favicon provider, and every template has a `{host}` placeholder
/// - `icons.timeout_secs` between 1 and 120
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// File system paths
    pub paths: PathConfig,
    /// Web server settings
    pub server: ServerConfig,
    /// Favicon settings
    pub icons: IconConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Loads configuration from an explicit file.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(config_path).context(format!(
            "Failed to read config file: {}",
            config_path.display()
        ))?;

        let config: Self = toml::from_str(&content).context(format!(
            "Failed to parse config file: {}",
            config_path.display()
        ))?;

        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to the config file using atomic write.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Saves configuration to an explicit file.
    ///
    /// Uses temp file + rename pattern for atomic writes.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(config_dir) = config_path.parent() {
            fs::create_dir_all(config_dir).context(format!(
                "Failed to create config directory: {}",
                config_dir.display()
            ))?;
        }

        // Serialize to TOML
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        let temp_path = config_path.with_extension("toml.tmp");

        // Write to temp file
        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        // Atomic rename
        fs::rename(&temp_path, config_path).context(format!(
            "Failed to rename temp config file to: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be non-zero");
        }

        if self.icons.providers.is_empty() {
            anyhow::bail!("At least one favicon provider must be configured");
        }

        for provider in &self.icons.providers {
            if !provider.template.contains("{host}") {
                anyhow::bail!(
                    "Favicon provider '{}' template is missing the {{host}} placeholder",
                    provider.name
                );
            }
        }

        if !self.icons.sync_provider.contains("{host}") {
            anyhow::bail!("Icon sync provider template is missing the {{host}} placeholder");
        }

        if !(1..=120).contains(&self.icons.timeout_secs) {
            anyhow::bail!(
                "Icon timeout must be between 1 and 120 seconds, got {}",
                self.icons.timeout_secs
            );
        }

        Ok(())
    }
}
