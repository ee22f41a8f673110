//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/datalogue/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/datalogue/` (~/.config/datalogue/)
//! - State/Logs: `$XDG_STATE_HOME/datalogue/` (~/.local/state/datalogue/)

use crate::error::{Error, Result};
use crate::search::ScoringWeights;
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Result table presentation defaults
    #[serde(default)]
    pub table: TableConfig,

    /// Search behavior
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Result table presentation configuration
#[derive(Debug, Deserialize)]
pub struct TableConfig {
    /// Rows per page in the result view
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    10
}

/// Search configuration
///
/// The relevance weights are heuristic; only their relative ordering
/// (sql > summary > raw text > insights) is contractual, so the exact
/// values are left to configuration.
#[derive(Debug, Deserialize, Default)]
pub struct SearchConfig {
    /// Relevance scoring weights
    #[serde(default)]
    pub weights: ScoringWeights,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values that have hard constraints
    pub fn validate(&self) -> Result<()> {
        if self.table.page_size == 0 {
            return Err(Error::Config(
                "table.page_size must be at least 1".to_string(),
            ));
        }
        self.search.weights.validate()?;
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/datalogue/config.toml` (~/.config/datalogue/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("datalogue").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/datalogue/` (~/.local/state/datalogue/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("datalogue")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/datalogue/datalogue.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("datalogue.log")
    }
}
