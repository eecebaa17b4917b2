//! Analysis handle returned on submission

use super::result::AnalysisResult;
use crate::core::ids::{CacheKey, TaskId};
use crate::polling::policy::PollStrategy;
use serde::{Deserialize, Serialize};

/// Outcome of submitting an [`AnalysisRequest`](super::request::AnalysisRequest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisHandle {
    /// The result was already available; no polling needed.
    Cached(AnalysisResult),
    /// The result must be polled for.
    Pending {
        task_id: Option<TaskId>,
        cache_key: CacheKey,
    },
}

impl AnalysisHandle {
    pub fn pending(task_id: Option<TaskId>, cache_key: impl Into<CacheKey>) -> Self {
        Self::Pending {
            task_id,
            cache_key: cache_key.into(),
        }
    }

    /// The finished result, if this is a cache hit whose result is ready.
    ///
    /// A `Cached` handle whose result is not `done` still needs polling.
    pub fn ready_result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Cached(result) if result.is_ready() => Some(result),
            _ => None,
        }
    }

    pub fn cache_key(&self) -> Option<&CacheKey> {
        match self {
            Self::Cached(_) => None,
            Self::Pending { cache_key, .. } => Some(cache_key),
        }
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::Cached(_) => None,
            Self::Pending { task_id, .. } => task_id.as_ref(),
        }
    }

    /// Polling strategy this handle calls for: task-status when a task id
    /// is present, cache-key otherwise.
    pub fn preferred_strategy(&self) -> PollStrategy {
        if self.task_id().is_some() {
            PollStrategy::TaskStatus
        } else {
            PollStrategy::CacheKey
        }
    }
}
