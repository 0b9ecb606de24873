use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use marketplace_engine::RemoteSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::logging::LogDestination;

pub(crate) const DEFAULT_CONFIG_FILENAME: &str = "marketplace.ron";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

/// Backend endpoint as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RemoteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        let defaults = RemoteSettings::default();
        Self {
            base_url: defaults.base_url,
            api_key: defaults.api_key,
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
            request_timeout_secs: defaults.request_timeout.as_secs(),
        }
    }
}

impl RemoteConfig {
    pub fn settings(&self) -> RemoteSettings {
        RemoteSettings {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone().filter(|key| !key.trim().is_empty()),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub remote: RemoteConfig,
    pub log_destination: LogDestination,
    /// One of off/error/warn/info/debug/trace.
    pub log_level: String,
    pub feed_max_age_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            log_destination: LogDestination::File,
            log_level: "info".to_string(),
            feed_max_age_secs: 300,
        }
    }
}

impl AppConfig {
    /// Unrecognized levels fall back to `Info`.
    pub fn log_level(&self) -> LevelFilter {
        self.log_level.trim().parse().unwrap_or(LevelFilter::Info)
    }

    pub fn feed_max_age(&self) -> Duration {
        Duration::from_secs(self.feed_max_age_secs)
    }
}

/// Config path from the first command-line argument, else the working directory.
pub(crate) fn config_path(arg: Option<String>) -> PathBuf {
    arg.map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME))
}

/// A missing file yields the defaults; anything else unreadable is an error.
pub(crate) fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
