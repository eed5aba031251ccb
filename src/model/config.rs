use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration from config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base of the REST API, including the `/api` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Quiet period before a search input is acted on
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    /// How long a notification stays visible
    #[serde(default = "default_toast_ms")]
    pub toast_ms: u64,
    /// Window for the "due soon" count
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: u32,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            search_debounce_ms: default_search_debounce_ms(),
            toast_ms: default_toast_ms(),
            due_soon_days: default_due_soon_days(),
        }
    }
}

impl UiConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }

    pub fn due_soon_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.due_soon_days))
    }
}

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_toast_ms() -> u64 {
    2500
}

fn default_due_soon_days() -> u32 {
    7
}
