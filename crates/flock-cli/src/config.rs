//! Configuration loading for the `flock` binary.
//!
//! Settings come from `flock.toml`, searched in the working directory
//! and then the user config directory (`~/.config/flock/flock.toml` on
//! Linux). Every field has a default, so a missing file is not an error.
//! `FLOCK_SERVER` overrides the configured server URL.

use anyhow::{Context, Result};
use flock_core::error::ErrorCode;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the Mastodon-compatible server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout for timeline fetches, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the status database. Defaults to the user data directory.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Page size requested from the server.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_base_url() -> String {
    "https://mastodon.social".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_page_size() -> u32 {
    20
}

impl Config {
    /// Load configuration, preferring an explicit path when given.
    ///
    /// An explicit path must exist; the searched locations may not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::parse_file(path)?,
            None => match search_path() {
                Some(path) => Self::parse_file(&path)?,
                None => Self::default(),
            },
        };
        Ok(config.with_env_overrides(env::var("FLOCK_SERVER").ok()))
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| {
            format!(
                "[{}] {}: {}",
                ErrorCode::ConfigParseError.code(),
                ErrorCode::ConfigParseError.message(),
                path.display()
            )
        })
    }

    /// Apply environment overrides. Separated from `load` for testability.
    fn with_env_overrides(mut self, server: Option<String>) -> Self {
        if let Some(url) = server {
            if !url.is_empty() {
                self.server.base_url = url;
            }
        }
        self
    }

    /// Resolve the database path: configured, or the user data directory.
    pub fn db_path(&self) -> PathBuf {
        self.store.db_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("flock")
                .join("flock.db")
        })
    }
}

/// Search the standard config locations, nearest first.
fn search_path() -> Option<PathBuf> {
    let local = PathBuf::from("flock.toml");
    if local.is_file() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join("flock").join("flock.toml");
    user.is_file().then_some(user)
}
