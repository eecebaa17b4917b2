//! Analysis backend port
//!
//! Defines the interface to the REST service that runs analyses.

use async_trait::async_trait;
use careline_domain::{AnalysisHandle, AnalysisRequest, AnalysisResult, CacheKey, TaskId, TaskState};
use thiserror::Error;

/// Errors that can occur while talking to the analysis backend.
///
/// Every variant is transport-level: the poll loop retries them and only
/// surfaces one as [`AnalysisError::Network`](careline_domain::AnalysisError::Network)
/// on the final attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Client for the analysis backend.
///
/// Implementations (adapters) live in the infrastructure layer. Callers
/// cancel an in-flight call by dropping its future.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Submit an analysis (`POST /analyses`).
    async fn start_analysis(&self, request: &AnalysisRequest)
    -> Result<AnalysisHandle, BackendError>;

    /// Query job execution state (`GET /tasks/{task_id}/status`).
    async fn task_status(&self, task_id: &TaskId) -> Result<TaskState, BackendError>;

    /// Read the stored result (`GET /analyses/{cache_key}`).
    async fn fetch_result(&self, cache_key: &CacheKey) -> Result<AnalysisResult, BackendError>;
}
