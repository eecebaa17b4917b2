//! Analysis result and task state value objects

use serde::{Deserialize, Serialize};

/// Status of a stored analysis result.
///
/// Unknown statuses decode as [`AnalysisStatus::Processing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Done,
    Error,
    #[serde(other)]
    Processing,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Processing => "processing",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An analysis result as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub status: AnalysisStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
}

impl AnalysisResult {
    pub fn done(text: impl Into<String>) -> Self {
        Self {
            status: AnalysisStatus::Done,
            response_text: Some(text.into()),
        }
    }

    pub fn processing() -> Self {
        Self {
            status: AnalysisStatus::Processing,
            response_text: None,
        }
    }

    pub fn error() -> Self {
        Self {
            status: AnalysisStatus::Error,
            response_text: None,
        }
    }

    /// `done` with a non-empty response text.
    ///
    /// A `done` payload without text has not materialized yet and is
    /// treated like `processing`.
    pub fn is_ready(&self) -> bool {
        self.status == AnalysisStatus::Done
            && self
                .response_text
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty())
    }

    pub fn text(&self) -> &str {
        self.response_text.as_deref().unwrap_or("")
    }
}

/// Execution state of a backend job.
///
/// Unknown states decode as [`TaskState::Pending`] so a new server-side
/// state keeps the client polling instead of aborting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Progress,
    Success,
    Failure,
    #[serde(other)]
    Pending,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Progress => "PROGRESS",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
