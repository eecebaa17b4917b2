//! Backend connection settings from TOML (`[backend]` section)

use serde::{Deserialize, Serialize};

/// Default analysis service URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Raw backend configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Base URL of the analysis REST API
    pub base_url: String,
    /// Bearer token sent on every request
    pub api_token: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            request_timeout_seconds: 30,
        }
    }
}
