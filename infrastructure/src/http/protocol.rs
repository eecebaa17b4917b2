//! Wire types for the analysis REST API.
//!
//! ```text
//! POST /analyses              {symptom_text, conversation_id}
//!   -> {already_cached, status?, response?, task_id?, cache_key?}
//! GET  /tasks/{task_id}/status
//!   -> {state: "PENDING" | "PROGRESS" | "SUCCESS" | "FAILURE"}
//! GET  /analyses/{cache_key}
//!   -> {status: "done" | "processing" | "error", response?}
//! ```

use super::error::{HttpError, Result};
use careline_domain::{AnalysisHandle, AnalysisRequest, AnalysisResult, AnalysisStatus, TaskId, TaskState};
use serde::{Deserialize, Serialize};

/// Body of `POST /analyses`.
#[derive(Debug, Serialize)]
pub struct StartAnalysisBody<'a> {
    pub symptom_text: &'a str,
    pub conversation_id: &'a str,
}

impl<'a> From<&'a AnalysisRequest> for StartAnalysisBody<'a> {
    fn from(request: &'a AnalysisRequest) -> Self {
        Self {
            symptom_text: request.symptom_text(),
            conversation_id: request.conversation_id().as_str(),
        }
    }
}

/// Response of `POST /analyses`.
#[derive(Debug, Deserialize)]
pub struct StartAnalysisResponse {
    #[serde(default)]
    pub already_cached: bool,
    #[serde(default)]
    pub status: Option<AnalysisStatus>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub cache_key: Option<String>,
}

impl StartAnalysisResponse {
    /// Map to a handle.
    ///
    /// Only `already_cached` with status `done` and a non-empty response is
    /// a cache hit; anything else must carry a cache key to poll. An empty
    /// `task_id` counts as absent.
    pub fn into_handle(self) -> Result<AnalysisHandle> {
        if self.already_cached && self.status == Some(AnalysisStatus::Done) {
            let result = AnalysisResult {
                status: AnalysisStatus::Done,
                response_text: self.response.clone(),
            };
            if result.is_ready() {
                return Ok(AnalysisHandle::Cached(result));
            }
        }

        let cache_key = self
            .cache_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                HttpError::UnexpectedResponse(
                    "analysis is not cached and response has no cache_key".to_string(),
                )
            })?;
        let task_id = self
            .task_id
            .filter(|t| !t.trim().is_empty())
            .map(TaskId::new);

        Ok(AnalysisHandle::pending(task_id, cache_key))
    }
}

/// Response of `GET /tasks/{task_id}/status`.
#[derive(Debug, Deserialize)]
pub struct TaskStatusResponse {
    pub state: TaskState,
}

/// Response of `GET /analyses/{cache_key}`.
#[derive(Debug, Deserialize)]
pub struct AnalysisResultResponse {
    pub status: AnalysisStatus,
    #[serde(default)]
    pub response: Option<String>,
}

impl From<AnalysisResultResponse> for AnalysisResult {
    fn from(wire: AnalysisResultResponse) -> Self {
        Self {
            status: wire.status,
            response_text: wire.response,
        }
    }
}
