//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! backend origin, request timeout, which storage backend holds the
//! session, and the last username used to log in.
//!
//! Configuration is stored at `~/.config/carecue/config.json`. The backend
//! URL and store can be overridden with `CARECUE_BACKEND_URL` and
//! `CARECUE_STORE`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config directory paths
const APP_NAME: &str = "carecue";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend origin used when nothing is configured
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const ENV_BACKEND_URL: &str = "CARECUE_BACKEND_URL";
const ENV_STORE: &str = "CARECUE_STORE";

/// Where the session is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StoreKind::File),
            "keyring" | "keychain" => Ok(StoreKind::Keyring),
            "memory" => Ok(StoreKind::Memory),
            other => Err(anyhow::anyhow!("Unknown session store '{}'", other)),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreKind::File => "file",
            StoreKind::Keyring => "keyring",
            StoreKind::Memory => "memory",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    pub request_timeout_secs: u64,
    pub store: StoreKind,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            store: StoreKind::default(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// The config file alone, without environment overrides
    fn load_file() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Record the last login name in the config file, leaving any
    /// environment or command-line overrides out of it.
    pub fn remember_username(&mut self, username: &str) -> Result<()> {
        self.last_username = Some(username.to_string());
        let mut stored = Self::load_file()?;
        stored.last_username = Some(username.to_string());
        stored.save()
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents).context("Failed to write config file")?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|u| !u.trim().is_empty()) {
            self.backend_url = url.trim().to_string();
        }
        if let Some(store) = lookup(ENV_STORE) {
            match store.parse() {
                Ok(kind) => self.store = kind,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_STORE),
            }
        }
    }

    /// Backend origin without a trailing slash
    pub fn base_url(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url(), "http://127.0.0.1:8000");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.store, StoreKind::File);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"backend_url": "https://care.example/"}"#).unwrap();
        assert_eq!(config.base_url(), "https://care.example");
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.last_username, None);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| match key {
            "CARECUE_BACKEND_URL" => Some("http://10.0.0.5:9000".to_string()),
            "CARECUE_STORE" => Some("Keychain".to_string()),
            _ => None,
        });
        assert_eq!(config.backend_url, "http://10.0.0.5:9000");
        assert_eq!(config.store, StoreKind::Keyring);

        // Bad store names are ignored
        config.apply_env_overrides(|key| (key == "CARECUE_STORE").then(|| "floppy".to_string()));
        assert_eq!(config.store, StoreKind::Keyring);
    }

    #[test]
    fn test_store_kind_parse() {
        assert_eq!("file".parse::<StoreKind>().unwrap(), StoreKind::File);
        assert_eq!("MEMORY".parse::<StoreKind>().unwrap(), StoreKind::Memory);
        assert!("floppy".parse::<StoreKind>().is_err());
    }
}
