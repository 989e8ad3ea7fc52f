//! Application configuration management.
//!
//! This module handles loading and saving the configuration: the backend
//! base URL, which cookie jar holds the session, and the UX delays around
//! sign-up and sign-out.
//!
//! Configuration is stored at `~/.config/authdeck/config.json`. The base URL
//! can be overridden with the `AUTHDECK_API_URL` environment variable.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{
    AuthenticatedPolicy, CookieJar, FileJar, KeyringJar, MemoryJar, SessionTimings,
};

/// Application name used for config/data directory paths
const APP_NAME: &str = "authdeck";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Cookie file name in the data directory
const COOKIE_FILE: &str = "cookies.json";

/// Environment variable holding the backend base URL
pub const API_URL_ENV: &str = "AUTHDECK_API_URL";

/// Where the session cookie is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub store: StoreKind,
    pub cookie_file: Option<PathBuf>,
    pub sign_up_redirect_delay_ms: u64,
    pub sign_out_delay_ms: u64,
    pub authenticated_policy: AuthenticatedPolicy,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        let timings = SessionTimings::default();
        Self {
            api_base_url: None,
            store: StoreKind::default(),
            cookie_file: None,
            sign_up_redirect_delay_ms: timings.sign_up_redirect.as_millis() as u64,
            sign_out_delay_ms: timings.sign_out_delay.as_millis() as u64,
            authenticated_policy: AuthenticatedPolicy::default(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path`, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Base URL from the environment, else from the config file.
    pub fn api_base_url(&self) -> Result<String> {
        self.api_base_url_with(std::env::var(API_URL_ENV).ok())
    }

    fn api_base_url_with(&self, env_value: Option<String>) -> Result<String> {
        env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No API base URL configured. Set {} or api_base_url in {}",
                    API_URL_ENV,
                    CONFIG_FILE
                )
            })
    }

    pub fn cookie_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.cookie_file {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(COOKIE_FILE))
    }

    /// Build the configured cookie jar.
    pub fn cookie_jar(&self) -> Result<Arc<dyn CookieJar>> {
        Ok(match self.store {
            StoreKind::File => Arc::new(FileJar::new(self.cookie_path()?)),
            StoreKind::Keyring => Arc::new(KeyringJar::new(APP_NAME)),
            StoreKind::Memory => Arc::new(MemoryJar::new()),
        })
    }

    pub fn timings(&self) -> SessionTimings {
        SessionTimings {
            sign_up_redirect: Duration::from_millis(self.sign_up_redirect_delay_ms),
            sign_out_delay: Duration::from_millis(self.sign_out_delay_ms),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
