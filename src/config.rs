//! Configuration management for remcon.
//!
//! Configuration is loaded from `~/.config/remcon/config.toml`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::console::OrderingPolicy;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Console behavior.
    #[serde(default)]
    pub console: ConsolePrefs,
    /// Named actions for the command endpoint, keyed by action name.
    #[serde(default = "default_actions")]
    pub actions: BTreeMap<String, ActionConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            console: ConsolePrefs::default(),
            actions: default_actions(),
        }
    }
}

/// Remote console server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the console server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

/// Console behavior preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsolePrefs {
    /// How outcomes of overlapping requests are applied to the transcript.
    #[serde(default)]
    pub ordering: OrderingPolicy,
}

/// A named action: a fixed command name and value for the command endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    pub cmd: String,
    #[serde(default)]
    pub val: i64,
}

fn default_actions() -> BTreeMap<String, ActionConfig> {
    let mut actions = BTreeMap::new();
    actions.insert(
        "ping".to_string(),
        ActionConfig {
            cmd: "ping".to_string(),
            val: 0,
        },
    );
    actions
}

impl Config {
    /// Get the config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("remcon"))
            .context("Could not determine config directory")
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, using defaults if not found.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}
