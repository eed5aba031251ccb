use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::AppConfig;

pub const API_URL_ENV: &str = "GIGBOARD_API_URL";

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// `<config_dir>/gigboard/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gigboard").join("config.toml"))
}

/// Read the config file. A missing file yields the defaults.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Resolve the effective config: file (or defaults), then the environment,
/// then an explicit base URL override.
pub fn load_config(path: Option<&Path>, api_url: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut config = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(p) => read_config(&p)?,
        None => AppConfig::default(),
    };
    if let Ok(url) = std::env::var(API_URL_ENV)
        && !url.trim().is_empty()
    {
        config.server.base_url = url.trim().to_string();
    }
    if let Some(url) = api_url.map(str::trim).filter(|u| !u.is_empty()) {
        config.server.base_url = url.to_string();
    }
    Ok(config)
}
