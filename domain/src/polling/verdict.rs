//! Classification of a single poll observation.

use crate::analysis::result::{AnalysisResult, AnalysisStatus};

/// What one poll attempt observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollVerdict<T> {
    /// Terminal success carrying the value.
    Ready(T),
    /// Terminal failure reported by the backend.
    Failed(String),
    /// Not finished yet; the label names the observed state.
    Pending(String),
}

impl<T> PollVerdict<T> {
    pub fn pending(label: impl Into<String>) -> Self {
        Self::Pending(label.into())
    }
}

impl PollVerdict<AnalysisResult> {
    /// Classify a stored result: `done` with text is ready, `error` fails,
    /// anything else (including `done` without text) keeps polling.
    pub fn from_result(result: AnalysisResult) -> Self {
        if result.is_ready() {
            return Self::Ready(result);
        }
        match result.status {
            AnalysisStatus::Error => Self::Failed(
                result
                    .response_text
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| "backend reported status 'error'".to_string()),
            ),
            AnalysisStatus::Done => Self::pending("done (empty response)"),
            AnalysisStatus::Processing => Self::pending("processing"),
        }
    }
}
