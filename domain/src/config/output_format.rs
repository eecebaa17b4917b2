//! Output format value object

use serde::{Deserialize, Serialize};

/// How an analysis result is rendered for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The assistant message as plain text (default)
    #[default]
    Text,
    /// The result and session outcome as JSON
    Json,
}
