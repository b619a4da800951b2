//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_name` or `user_agent` is empty
    /// - `origin` is not an absolute http(s) URL
    /// - `app_shell` is empty, or it or `fallback_image` holds a path not starting with `/`
    /// - `offline_status` is not a 5xx code
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(invalid("cache_name", "must not be empty"));
        }

        let origin = self.origin_url().map_err(|e| invalid("origin", e.to_string()))?;
        if origin.scheme() != "http" && origin.scheme() != "https" {
            return Err(invalid("origin", format!("unsupported scheme: {}", origin.scheme())));
        }

        if self.app_shell.is_empty() {
            return Err(invalid("app_shell", "must list at least one path"));
        }
        if let Some(path) = self.app_shell.iter().find(|p| !p.starts_with('/')) {
            return Err(invalid("app_shell", format!("path must start with '/': {path}")));
        }

        if !self.fallback_image.starts_with('/') {
            return Err(invalid("fallback_image", "path must start with '/'"));
        }
        if !self.app_shell.contains(&self.fallback_image) {
            tracing::warn!(
                fallback_image = %self.fallback_image,
                "fallback_image is not part of app_shell; image fallbacks will miss until it is cached"
            );
        }

        if !(500..=599).contains(&self.offline_status) {
            return Err(invalid("offline_status", "must be a 5xx status code"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        Ok(())
    }
}
