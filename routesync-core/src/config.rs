//! Sync configuration.
//!
//! Defaults can be overridden by an optional YAML file. Lookup order:
//! an explicit path, else `<home>/.routesync/config.yaml` when it exists.
//!
//! ```yaml
//! base_url: https://ridewithgps.com
//! index_file: /var/lib/routesync/index.txt
//! page_size: 100
//! request_timeout_secs: 30
//! download_delay_ms: 200
//! ```
//!
//! As in the rest of the crate, `_at(home)` variants exist so tests never
//! touch the real home directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://ridewithgps.com";
pub const DEFAULT_INDEX_FILE: &str = "index.txt";
pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_DOWNLOAD_DELAY: Duration = Duration::from_millis(200);

/// Everything one sync pass needs besides the user and credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Remote API root, without trailing slash.
    pub base_url: String,
    /// Persisted index location.
    pub index_path: PathBuf,
    /// Routes requested per listing page.
    pub page_size: usize,
    pub request_timeout: Duration,
    /// Pause applied per simulated content fetch.
    pub download_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            index_path: PathBuf::from(DEFAULT_INDEX_FILE),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            download_delay: DEFAULT_DOWNLOAD_DELAY,
        }
    }
}

/// On-disk config; every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_url: Option<String>,
    index_file: Option<PathBuf>,
    page_size: Option<usize>,
    request_timeout_secs: Option<u64>,
    download_delay_ms: Option<u64>,
}

impl SyncConfig {
    /// Replace the base URL, normalising away trailing slashes.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = path.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".to_string()));
        }
        if self.base_url.is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }
        Ok(())
    }

    fn apply(mut self, file: ConfigFile) -> Self {
        if let Some(url) = file.base_url {
            self = self.with_base_url(url);
        }
        if let Some(path) = file.index_file {
            self.index_path = path;
        }
        if let Some(size) = file.page_size {
            self.page_size = size;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = file.download_delay_ms {
            self.download_delay = Duration::from_millis(ms);
        }
        self
    }
}

/// `<home>/.routesync/config.yaml` — pure, no I/O.
pub fn default_config_path_at(home: &Path) -> PathBuf {
    home.join(".routesync").join("config.yaml")
}

/// Load defaults overlaid with the YAML file at `path`.
pub fn load_file(path: &Path) -> Result<SyncConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // An empty file is a valid "all defaults" config.
    let file: ConfigFile = if contents.trim().is_empty() {
        ConfigFile::default()
    } else {
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };
    let config = SyncConfig::default().apply(file);
    config.validate()?;
    Ok(config)
}

/// Resolve the effective config: `explicit` if given, else the per-user file
/// under `home` when present, else defaults.
pub fn load_at(home: &Path, explicit: Option<&Path>) -> Result<SyncConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_file(path);
    }
    let path = default_config_path_at(home);
    if path.exists() {
        return load_file(&path);
    }
    Ok(SyncConfig::default())
}

/// `load_at` convenience wrapper; falls back to defaults when no home directory exists.
pub fn load(explicit: Option<&Path>) -> Result<SyncConfig, ConfigError> {
    match (dirs::home_dir(), explicit) {
        (Some(home), _) => load_at(&home, explicit),
        (None, Some(path)) => load_file(path),
        (None, None) => Ok(SyncConfig::default()),
    }
}
