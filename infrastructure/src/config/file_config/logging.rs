//! Logging settings from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving one record per submission, attempt and outcome
    pub analysis_log: Option<String>,
    /// Directory for the rolling tracing log file
    pub log_dir: Option<String>,
}
