//! Client configuration.
//!
//! Loaded from a TOML file when one exists, otherwise defaulted. The API base
//! URL can always be overridden from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::storage::StorageBackend;

/// Environment variable that overrides `server_domain`.
pub const BASE_URL_ENV: &str = "RECIPE_API_BASE_URL";

const DEFAULT_SERVER_DOMAIN: &str = "http://localhost:3000";
const APP_DIR_NAME: &str = "recipe-state";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the recipe API; endpoint paths are joined onto it.
    pub server_domain: String,
    /// Timeout applied to every HTTP request.
    pub request_timeout_secs: u64,
    /// Upper bound on a single liked/favorited/viewed lookup, transport included.
    pub lookup_timeout_secs: u64,
    pub storage: StorageBackend,
    /// Where the JSON or SQLite store lives. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_domain: DEFAULT_SERVER_DOMAIN.to_string(),
            request_timeout_secs: 10,
            lookup_timeout_secs: 10,
            storage: StorageBackend::default(),
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load config from a TOML file. A missing file yields the defaults.
    /// The environment override is applied in both cases.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {:?}", path))?;
            let config: ClientConfig = toml::from_str(&content)
                .with_context(|| format!("Invalid config file {:?}", path))?;
            info!("Loaded config from {:?}", path);
            config
        } else {
            debug!("No config file at {:?}, using defaults", path);
            ClientConfig::default()
        };
        Ok(config.with_env_override(std::env::var(BASE_URL_ENV).ok()))
    }

    /// Load from the platform config location.
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(ClientConfig::default().with_env_override(std::env::var(BASE_URL_ENV).ok())),
        }
    }

    fn with_env_override(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            info!("Using API base URL from {}: {}", BASE_URL_ENV, url);
            self.server_domain = url.trim().to_string();
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    /// Resolve the data directory, falling back to the platform default and
    /// finally to the working directory.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR_NAME))
    }
}

/// `<config dir>/recipe-state/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}
