//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWPROXY_*)
//! 2. TOML config file (if SWPROXY_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

mod validation;

pub use validation::ConfigError;

/// Which [`CacheStorage`](crate::CacheStorage) backend the host builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Sqlite,
    Memory,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWPROXY_*)
/// 2. TOML config file (if SWPROXY_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the current cache generation.
    ///
    /// Bump on every app-shell change; activation deletes every other name.
    /// Set via SWPROXY_CACHE_NAME environment variable.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Origin that shell and fallback paths are resolved against.
    ///
    /// Set via SWPROXY_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Paths fetched and stored on install.
    ///
    /// Set via SWPROXY_APP_SHELL environment variable (`[/,/app.css]`).
    #[serde(default = "default_app_shell")]
    pub app_shell: Vec<String>,

    /// Cached path served when an image cannot be fetched.
    #[serde(default = "default_fallback_image")]
    pub fallback_image: String,

    /// Status of the synthetic response for unreachable sub-resources.
    #[serde(default = "default_offline_status")]
    pub offline_status: u16,

    /// Body of the synthetic response for unreachable sub-resources.
    #[serde(default = "default_offline_body")]
    pub offline_body: String,

    /// Storage backend.
    ///
    /// Set via SWPROXY_STORAGE environment variable (`sqlite` or `memory`).
    #[serde(default)]
    pub storage: StorageKind,

    /// Path to SQLite cache database.
    ///
    /// Set via SWPROXY_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network request timeout in milliseconds.
    ///
    /// Set via SWPROXY_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body bytes accepted from the network.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Maximum redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Run install then activate when the host starts.
    #[serde(default = "default_true")]
    pub auto_install: bool,
}

/// Shell resources the application needs to boot offline.
pub const DEFAULT_APP_SHELL: [&str; 7] = [
    "/",
    "/static/css/styles.css",
    "/static/icons/favicon.svg",
    "/static/icons/favicon-96x96.png",
    "/static/icons/web-app-manifest-192x192.png",
    "/static/icons/web-app-manifest-512x512.png",
    "/manifest.webmanifest",
];

fn default_cache_name() -> String {
    "palinsesto-tv-v2".into()
}

fn default_origin() -> String {
    "http://localhost:5001".into()
}

fn default_app_shell() -> Vec<String> {
    DEFAULT_APP_SHELL.iter().map(|p| p.to_string()).collect()
}

fn default_fallback_image() -> String {
    "/static/icons/favicon.svg".into()
}

fn default_offline_status() -> u16 {
    503
}

fn default_offline_body() -> String {
    "Network error".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swproxy-cache.sqlite")
}

fn default_user_agent() -> String {
    "swproxy/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_max_redirects() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            origin: default_origin(),
            app_shell: default_app_shell(),
            fallback_image: default_fallback_image(),
            offline_status: default_offline_status(),
            offline_body: default_offline_body(),
            storage: StorageKind::default(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            max_redirects: default_max_redirects(),
            auto_install: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed origin URL.
    pub fn origin_url(&self) -> Result<Url, Error> {
        Url::parse(&self.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.origin)))
    }

    /// Resolve a configured path (e.g. `/static/css/styles.css`) against the origin.
    pub fn resolve(&self, path: &str) -> Result<Url, Error> {
        self.origin_url()?
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }

    /// Absolute URLs of every shell resource, in configured order.
    pub fn shell_urls(&self) -> Result<Vec<Url>, Error> {
        self.app_shell.iter().map(|p| self.resolve(p)).collect()
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWPROXY_`
    /// 2. TOML file from `SWPROXY_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWPROXY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWPROXY_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
