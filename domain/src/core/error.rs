//! Domain error types

use super::ids::CacheKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of an [`AnalysisError`].
///
/// The presentation layer picks user-facing copy per kind; this type is
/// what crosses that boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisErrorKind {
    Failure,
    Timeout,
    Network,
    Cancelled,
    DuplicateSession,
    InvalidRequest,
}

impl AnalysisErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Failure => "failure",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Cancelled => "cancelled",
            Self::DuplicateSession => "duplicate_session",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

impl std::fmt::Display for AnalysisErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that end an analysis request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The backend reported the job as failed (`FAILURE` task state or
    /// `error` result status). Never retried.
    #[error("Analysis failed: {0}")]
    Failure(String),

    /// Attempts were exhausted without a terminal signal. The job may
    /// still complete server-side.
    #[error("Analysis timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// Transport error on the final permitted attempt (or on submission).
    #[error("Network error: {0}")]
    Network(String),

    #[error("Operation cancelled")]
    Cancelled,

    /// Another session is already polling this cache key.
    #[error("Analysis {0} is already being polled")]
    DuplicateSession(CacheKey),

    #[error("Invalid analysis request: {0}")]
    InvalidRequest(String),
}

impl AnalysisError {
    pub fn kind(&self) -> AnalysisErrorKind {
        match self {
            Self::Failure(_) => AnalysisErrorKind::Failure,
            Self::Timeout { .. } => AnalysisErrorKind::Timeout,
            Self::Network(_) => AnalysisErrorKind::Network,
            Self::Cancelled => AnalysisErrorKind::Cancelled,
            Self::DuplicateSession(_) => AnalysisErrorKind::DuplicateSession,
            Self::InvalidRequest(_) => AnalysisErrorKind::InvalidRequest,
        }
    }

    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = AnalysisError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(AnalysisError::Cancelled.is_cancelled());
        assert!(!AnalysisError::Timeout { attempts: 3 }.is_cancelled());
        assert!(!AnalysisError::Failure("boom".to_string()).is_cancelled());
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            AnalysisError::Failure("x".into()).kind(),
            AnalysisErrorKind::Failure
        );
        assert_eq!(
            AnalysisError::Timeout { attempts: 60 }.kind(),
            AnalysisErrorKind::Timeout
        );
        assert_eq!(
            AnalysisError::Network("refused".into()).kind(),
            AnalysisErrorKind::Network
        );
        assert_eq!(
            AnalysisError::DuplicateSession(CacheKey::new("k")).kind(),
            AnalysisErrorKind::DuplicateSession
        );
    }

    #[test]
    fn test_timeout_display_includes_attempts() {
        let error = AnalysisError::Timeout { attempts: 30 };
        assert_eq!(error.to_string(), "Analysis timed out after 30 attempts");
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&AnalysisErrorKind::DuplicateSession).unwrap();
        assert_eq!(json, "\"duplicate_session\"");
    }
}
