//! Configuration types for the quizdesk admin console.
//!
//! This module provides the configuration structure controlling where the
//! backend lives, where the bearer token is persisted, cache staleness, and
//! the display constants used by the pool search, tag autocomplete, backup
//! time conversion, and the restore progress crawl.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "quizdesk.json";

/// Default backend base URL (all endpoint paths are appended to it).
fn default_api_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

/// Default path of the persisted bearer token.
fn default_token_file() -> String {
    ".quizdesk/token".to_string()
}

/// Default per-request timeout in seconds.
const fn default_request_timeout() -> u64 {
    30
}

/// Default lifetime of cached user and topic lists in seconds.
const fn default_cache_ttl() -> u64 {
    300
}

/// Default fixed offset used to display backup times.
const fn default_backup_offset() -> i32 {
    3
}

/// Default number of pool rows rendered for a search.
const fn default_pool_display_limit() -> usize {
    100
}

/// Default number of tag autocomplete suggestions.
const fn default_suggestion_limit() -> usize {
    8
}

/// Default interval of the simulated restore crawl in milliseconds.
const fn default_crawl_interval() -> u64 {
    350
}

/// Main configuration for the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the REST API, e.g. `https://example.org/api`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// File holding the bearer token between invocations.
    #[serde(default = "default_token_file")]
    pub token_file: String,

    /// Timeout applied to every request in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How long the user list and topic tree stay fresh, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Offset in hours between UTC and the displayed backup time.
    #[serde(default = "default_backup_offset")]
    pub backup_utc_offset_hours: i32,

    /// Maximum number of pool rows shown for one search.
    #[serde(default = "default_pool_display_limit")]
    pub pool_display_limit: usize,

    /// Maximum number of autocomplete suggestions per tag slot.
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    /// Step interval of the simulated restore progress, in milliseconds.
    #[serde(default = "default_crawl_interval")]
    pub restore_crawl_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            token_file: default_token_file(),
            request_timeout_secs: default_request_timeout(),
            cache_ttl_secs: default_cache_ttl(),
            backup_utc_offset_hours: default_backup_offset(),
            pool_display_limit: default_pool_display_limit(),
            suggestion_limit: default_suggestion_limit(),
            restore_crawl_interval_ms: default_crawl_interval(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `quizdesk.json` in the current directory. If not found,
    /// returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            CoreError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `quizdesk.json` in a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ConfigParseError` if the file exists but contains
    /// invalid JSON, and `CoreError::ConfigValidationError` if the values are
    /// out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(CoreError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| CoreError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(CoreError::config_validation(
                "apiBaseUrl must not be empty",
                "Set apiBaseUrl to the backend address in your quizdesk.json",
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::config_validation(
                format!("apiBaseUrl must start with http:// or https://, got '{url}'"),
                "Use a full URL such as https://example.org/api for apiBaseUrl",
            ));
        }

        if self.token_file.trim().is_empty() {
            return Err(CoreError::config_validation(
                "tokenFile must not be empty",
                "Provide a writable path for tokenFile in your quizdesk.json",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(CoreError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Set requestTimeoutSecs to at least 1 in your quizdesk.json",
            ));
        }

        if self.cache_ttl_secs == 0 {
            return Err(CoreError::config_validation(
                "cacheTtlSecs must be greater than 0",
                "Set cacheTtlSecs to at least 1 in your quizdesk.json",
            ));
        }

        if !(-12..=14).contains(&self.backup_utc_offset_hours) {
            return Err(CoreError::config_validation(
                format!(
                    "backupUtcOffsetHours must be between -12 and 14, got {}",
                    self.backup_utc_offset_hours
                ),
                "Set backupUtcOffsetHours to a real UTC offset (3 for Moscow time)",
            ));
        }

        if self.pool_display_limit == 0 {
            return Err(CoreError::config_validation(
                "poolDisplayLimit must be greater than 0",
                "Set poolDisplayLimit to at least 1 in your quizdesk.json",
            ));
        }

        if self.suggestion_limit == 0 {
            return Err(CoreError::config_validation(
                "suggestionLimit must be greater than 0",
                "Set suggestionLimit to at least 1 in your quizdesk.json",
            ));
        }

        if self.restore_crawl_interval_ms == 0 {
            return Err(CoreError::config_validation(
                "restoreCrawlIntervalMs must be greater than 0",
                "Set restoreCrawlIntervalMs to at least 1 in your quizdesk.json",
            ));
        }

        Ok(())
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }
}
