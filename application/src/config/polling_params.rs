//! Polling parameters: poll loop control.
//!
//! [`PollingParams`] groups the per-strategy [`PollPolicy`] values used by
//! [`AwaitAnalysisUseCase`](crate::use_cases::await_analysis::AwaitAnalysisUseCase).
//! These are application-layer concerns; the infrastructure config loader
//! builds them from the `[polling]` section.

use careline_domain::{PollPolicy, PollStrategy};
use std::time::Duration;

/// Retry bounds for both polling strategies.
///
/// | Strategy     | Default attempts | Default interval |
/// |--------------|------------------|------------------|
/// | task status  | 60               | 4s               |
/// | cache key    | 30               | 5s               |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingParams {
    pub task_status: PollPolicy,
    pub cache_key: PollPolicy,
}

impl Default for PollingParams {
    fn default() -> Self {
        Self {
            task_status: PollPolicy::task_status_default(),
            cache_key: PollPolicy::cache_key_default(),
        }
    }
}

impl PollingParams {
    pub fn policy_for(&self, strategy: PollStrategy) -> PollPolicy {
        match strategy {
            PollStrategy::TaskStatus => self.task_status,
            PollStrategy::CacheKey => self.cache_key,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_task_status(mut self, policy: PollPolicy) -> Self {
        self.task_status = policy;
        self
    }

    pub fn with_cache_key(mut self, policy: PollPolicy) -> Self {
        self.cache_key = policy;
        self
    }

    /// Set the transport-error backoff on both strategies.
    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.task_status = self.task_status.with_error_backoff(backoff);
        self.cache_key = self.cache_key.with_error_backoff(backoff);
        self
    }
}
