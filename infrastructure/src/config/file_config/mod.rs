//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod backend;
mod logging;
mod output;
mod polling;

pub use backend::{DEFAULT_BASE_URL, FileBackendConfig};
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use polling::{FilePolicyConfig, FilePollingConfig};

use crate::http::HttpBackendConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("backend.base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("backend.request_timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("polling.{strategy}.max_attempts cannot be 0")]
    ZeroAttempts { strategy: &'static str },

    #[error("polling.{strategy}.interval_ms cannot be 0")]
    ZeroInterval { strategy: &'static str },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Analysis service connection
    pub backend: FileBackendConfig,
    /// Retry bounds for both polling strategies
    pub polling: FilePollingConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Log file locations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration, stopping at the first problem.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBaseUrl);
        }
        if self.backend.request_timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }

        for (strategy, section) in [
            ("task_status", &self.polling.task_status),
            ("cache_key", &self.polling.cache_key),
        ] {
            if section.max_attempts == Some(0) {
                return Err(ConfigValidationError::ZeroAttempts { strategy });
            }
            if section.interval_ms == Some(0) {
                return Err(ConfigValidationError::ZeroInterval { strategy });
            }
        }

        Ok(())
    }

    /// Connection settings for the HTTP backend adapter.
    pub fn to_backend_config(&self) -> HttpBackendConfig {
        HttpBackendConfig::new(self.backend.base_url.trim())
            .with_api_token(self.backend.api_token.clone())
            .with_request_timeout(Duration::from_secs(self.backend.request_timeout_seconds))
    }
}
