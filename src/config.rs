//! Application configuration management
//!
//! Handles loading and saving application settings including:
//! - Backend base URL
//! - Login callback port and analysis window

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TunescopeError};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the analysis backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Localhost port the login redirect is captured on
    #[serde(default = "default_callback_port")]
    pub callback_port: u16,

    /// How many days of listening history the analysis covers
    #[serde(default = "default_days_back")]
    pub days_back: u32,

    /// Timeout for refresh and fetch requests, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_callback_port() -> u16 {
    8888
}

fn default_days_back() -> u32 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            callback_port: default_callback_port(),
            days_back: default_days_back(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = Self::project_dirs()?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory used for session storage
    pub fn data_dir() -> Result<PathBuf> {
        let project_dirs = Self::project_dirs()?;
        Ok(project_dirs.data_dir().to_path_buf())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "tunescope", "tunescope")
            .ok_or_else(|| TunescopeError::Config("Could not determine config directory".into()))
    }
}
