//! Poll policy and strategy value objects

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Extra delay added to the interval after a transport error.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_millis(1000);

/// Which backend query style drives a polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStrategy {
    /// Query the job-queue task state, fetch the result on `SUCCESS`.
    TaskStatus,
    /// Query the stored result directly.
    CacheKey,
}

impl PollStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskStatus => "task_status",
            Self::CacheKey => "cache_key",
        }
    }
}

impl std::fmt::Display for PollStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed-interval retry bounds for one polling loop.
///
/// Backoff is flat. Only a transport error stretches a single wait by
/// `error_backoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    pub error_backoff: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }

    /// 60 attempts every 4s (about 4 minutes).
    pub fn task_status_default() -> Self {
        Self::new(60, Duration::from_millis(4000))
    }

    /// 30 attempts every 5s (about 2.5 minutes).
    pub fn cache_key_default() -> Self {
        Self::new(30, Duration::from_millis(5000))
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Wait after a transport error.
    pub fn error_delay(&self) -> Duration {
        self.interval + self.error_backoff
    }

    /// Nominal wall-clock bound when no transport errors occur.
    pub fn total_budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}
