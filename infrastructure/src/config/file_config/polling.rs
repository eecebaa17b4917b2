//! Polling settings from TOML (`[polling]` section)

use careline_application::PollingParams;
use careline_domain::PollPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-strategy overrides. Unset fields keep the strategy's default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePolicyConfig {
    pub max_attempts: Option<u32>,
    pub interval_ms: Option<u64>,
}

impl FilePolicyConfig {
    fn apply(&self, mut policy: PollPolicy) -> PollPolicy {
        if let Some(max) = self.max_attempts {
            policy = policy.with_max_attempts(max);
        }
        if let Some(ms) = self.interval_ms {
            policy = policy.with_interval(Duration::from_millis(ms));
        }
        policy
    }
}

/// Raw polling configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePollingConfig {
    /// `[polling.task_status]`
    pub task_status: FilePolicyConfig,
    /// `[polling.cache_key]`
    pub cache_key: FilePolicyConfig,
    /// Extra delay after a failed attempt, in milliseconds
    pub error_backoff_ms: Option<u64>,
}

impl FilePollingConfig {
    pub fn to_polling_params(&self) -> PollingParams {
        let defaults = PollingParams::default();
        let params = PollingParams::default()
            .with_task_status(self.task_status.apply(defaults.task_status))
            .with_cache_key(self.cache_key.apply(defaults.cache_key));
        match self.error_backoff_ms {
            Some(ms) => params.with_error_backoff(Duration::from_millis(ms)),
            None => params,
        }
    }
}
