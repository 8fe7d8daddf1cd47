//! Configuration settings for Podsum.

use crate::error::{PodsumError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub services: ServiceSettings,
    pub store: StoreSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level used when no `-v` flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.podsum".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Downstream service endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Base URL of the audio transcription service.
    pub audio_url: String,
    /// Base URL of the transcript chunking service.
    pub chunking_url: String,
    /// Base URL of the LLM analysis service.
    pub llm_url: String,
    /// Per-call timeout in seconds, covering the whole request.
    pub timeout_secs: u64,
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            audio_url: "http://localhost:8001".to_string(),
            chunking_url: "http://localhost:8002".to_string(),
            llm_url: "http://localhost:8003".to_string(),
            // Transcribing a full episode is slow
            timeout_secs: 600,
            connect_timeout_secs: 10,
        }
    }
}

impl ServiceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Episode store backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreProvider {
    /// SQLite database on disk (default).
    #[default]
    Sqlite,
    /// Process-local store, lost on exit.
    Memory,
}

impl std::str::FromStr for StoreProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StoreProvider::Sqlite),
            "memory" => Ok(StoreProvider::Memory),
            _ => Err(format!("Unknown store provider: {}", s)),
        }
    }
}

impl std::fmt::Display for StoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreProvider::Sqlite => write!(f, "sqlite"),
            StoreProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Episode store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Store provider (sqlite, memory).
    pub provider: StoreProvider,
    /// Path to the SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            provider: StoreProvider::Sqlite,
            sqlite_path: "~/.podsum/episodes.db".to_string(),
        }
    }
}

impl StoreSettings {
    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Settings::expand_path(&self.sqlite_path)
    }
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    ///
    /// Recognised keys: `AUDIO_SERVICE_URL`, `CHUNKING_SERVICE_URL`,
    /// `LLM_SERVICE_URL`, `PODSUM_DB_PATH`, `PODSUM_TIMEOUT_SECS`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AUDIO_SERVICE_URL") {
            self.services.audio_url = v;
        }
        if let Some(v) = lookup("CHUNKING_SERVICE_URL") {
            self.services.chunking_url = v;
        }
        if let Some(v) = lookup("LLM_SERVICE_URL") {
            self.services.llm_url = v;
        }
        if let Some(v) = lookup("PODSUM_DB_PATH") {
            self.store.sqlite_path = v;
        }
        if let Some(v) = lookup("PODSUM_STORE") {
            self.store.provider = v.trim().parse().map_err(PodsumError::Config)?;
        }
        if let Some(v) = lookup("PODSUM_TIMEOUT_SECS") {
            self.services.timeout_secs = v.trim().parse().map_err(|_| {
                PodsumError::Config(format!("PODSUM_TIMEOUT_SECS is not a number: {}", v))
            })?;
        }
        Ok(())
    }

    /// Check that the settings describe a usable pipeline.
    pub fn validate(&self) -> Result<()> {
        for (name, endpoint) in [
            ("services.audio_url", &self.services.audio_url),
            ("services.chunking_url", &self.services.chunking_url),
            ("services.llm_url", &self.services.llm_url),
        ] {
            let parsed = url::Url::parse(endpoint)
                .map_err(|e| PodsumError::Config(format!("{} ({}): {}", name, endpoint, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(PodsumError::Config(format!(
                    "{} must be an http(s) URL, got {}",
                    name, endpoint
                )));
            }
        }

        if self.services.timeout_secs == 0 {
            return Err(PodsumError::Config(
                "services.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podsum")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }
}
