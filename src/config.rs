//! Configuration file loading
//!
//! Settings are read from a YAML file. Every field is optional; anything left
//! out keeps its default.
//!
//! ```yaml
//! market:
//!   url: https://example.com/market.json
//!   ttl_seconds: 3600
//! quotes:
//!   url: https://zenquotes.io/api/quotes
//!   ttl_seconds: 0
//!   auto_refresh_interval_seconds: 30
//! http_timeout_seconds: 10
//! log_level: info
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::sync::RefreshPolicy;

/// File name looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = "pulseboard.yaml";

/// Error types for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// The config file exists but could not be read
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid YAML or has the wrong shape
    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    /// The config parsed but contains unusable values
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Endpoint and refresh rules for one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// HTTP GET endpoint returning the resource as JSON
    pub url: String,
    #[serde(flatten)]
    pub policy: RefreshPolicy,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub market: ResourceConfig,
    pub quotes: ResourceConfig,
    /// Request timeout applied to every fetch
    pub http_timeout_seconds: u64,
    /// Overrides the platform cache directory
    pub cache_dir: Option<PathBuf>,
    /// Log filter used when `PULSEBOARD_LOG` is not set
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            market: ResourceConfig {
                url: "http://localhost:8080/market.json".to_string(),
                policy: RefreshPolicy::ttl(3600),
            },
            quotes: ResourceConfig {
                url: "https://zenquotes.io/api/quotes".to_string(),
                policy: RefreshPolicy::ttl(0).with_auto_refresh(30),
            },
            http_timeout_seconds: 10,
            cache_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration.
    ///
    /// Search order:
    /// 1. Explicit path if provided (it must exist)
    /// 2. ./pulseboard.yaml
    /// 3. `<config dir>/pulseboard/config.yaml`
    ///
    /// Falls back to defaults when no file is found.
    ///
    /// # Arguments
    /// * `explicit_path` - Path given on the command line, if any
    ///
    /// # Returns
    /// * `Ok(Config)` with the loaded or default settings
    /// * `Err(ConfigError)` if the file is missing, unreadable or invalid
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit_path {
            Some(path) if path.exists() => Some(path.to_path_buf()),
            Some(path) => return Err(ConfigError::NotFound(path.to_path_buf())),
            None => Self::find_config_file(),
        };

        match path {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    fn find_config_file() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }

        let xdg_path = project_dirs()?.config_dir().join("config.yaml");
        xdg_path.exists().then_some(xdg_path)
    }

    /// Reads and validates a config file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "http_timeout_seconds must be greater than zero".to_string(),
            ));
        }
        for (name, resource) in [("market", &self.market), ("quotes", &self.quotes)] {
            if resource.url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} url is empty", name)));
            }
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "pulseboard")
}

/// Directory the log files are written to
pub fn default_log_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_local_dir().join("logs"))
}
