use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH, DEFAULT_FRAME_RATE,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SAMPLE_INTERVAL, DEFAULT_SERVER_URL, SERVER_URL_ENV,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Invalid(String),
    #[error("could not determine config directory")]
    NoConfigDir,
}

/// Client settings shared by the CLI and the desktop app.
///
/// Missing keys fall back to their defaults so older config files keep
/// loading after new settings are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub sample_interval: usize,
    pub capture_width: u32,
    pub capture_height: u32,
    pub frame_rate: u32,
    pub request_timeout_secs: u64,
    pub camera_device: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            capture_width: DEFAULT_CAPTURE_WIDTH,
            capture_height: DEFAULT_CAPTURE_HEIGHT,
            frame_rate: DEFAULT_FRAME_RATE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            camera_device: None,
        }
    }
}

impl ClientConfig {
    /// `<config dir>/FaceLens/config.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|d| d.join("FaceLens").join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Loads from the default location, then applies environment overrides.
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::default_path() {
            Ok(path) => Self::load_from(&path)?,
            Err(_) => Self::default(),
        };
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            config.apply_server_url(&url);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, json).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn apply_server_url(&mut self, url: &str) {
        let trimmed = url.trim().trim_end_matches('/');
        if !trimmed.is_empty() {
            self.server_url = trimmed.to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval < 1 {
            return Err(ConfigError::Invalid(
                "sample_interval must be >= 1".to_string(),
            ));
        }
        if self.frame_rate < 1 {
            return Err(ConfigError::Invalid("frame_rate must be >= 1".to_string()));
        }
        if self.capture_width == 0 || self.capture_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "capture size must be non-zero, got {}x{}",
                self.capture_width, self.capture_height
            )));
        }
        if reqwest::Url::parse(&self.server_url).is_err() {
            return Err(ConfigError::Invalid(format!(
                "server_url is not a valid URL: '{}'",
                self.server_url
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Interval between render ticks at the configured frame rate.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.frame_rate.max(1)))
    }
}
