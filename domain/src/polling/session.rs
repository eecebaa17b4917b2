//! Poll session state machine.
//!
//! Tracks one polling loop from its first attempt to a terminal state.
//!
//! # State Transitions
//!
//! ```text
//! Polling ──> Done
//!        ├──> Failed
//!        ├──> TimedOut
//!        └──> Cancelled
//! ```
//!
//! Every `mark_*` call is a no-op once the session is terminal, so a
//! session ends in exactly one state.

use super::policy::{PollPolicy, PollStrategy};
use crate::core::ids::CacheKey;
use std::time::Duration;

/// Lifecycle state of a [`PollSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollSessionState {
    Polling,
    Done,
    Failed { reason: String },
    TimedOut,
    Cancelled,
}

impl PollSessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Polling)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polling => "polling",
            Self::Done => "done",
            Self::Failed { .. } => "failed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Client-side bookkeeping for one in-flight polling loop.
///
/// Owned exclusively by the loop driving it and discarded when the loop
/// ends. `waited` accumulates scheduled sleeps, so it reflects the loop's
/// own timing independent of backend latency.
#[derive(Debug, Clone)]
pub struct PollSession {
    strategy: PollStrategy,
    cache_key: CacheKey,
    max_attempts: u32,
    attempts: u32,
    transient_errors: u32,
    waited: Duration,
    state: PollSessionState,
}

impl PollSession {
    pub fn new(strategy: PollStrategy, cache_key: CacheKey, policy: &PollPolicy) -> Self {
        Self {
            strategy,
            cache_key,
            max_attempts: policy.max_attempts,
            attempts: 0,
            transient_errors: 0,
            waited: Duration::ZERO,
            state: PollSessionState::Polling,
        }
    }

    /// Start the next attempt and return its 1-based number.
    ///
    /// Returns `None` when the session is terminal or out of attempts.
    pub fn begin_attempt(&mut self) -> Option<u32> {
        if self.state.is_terminal() || self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.attempts)
    }

    /// Whether the attempt in progress is the last one permitted.
    pub fn is_last_attempt(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    pub fn record_wait(&mut self, delay: Duration) {
        self.waited += delay;
    }

    pub fn record_transient_error(&mut self) {
        self.transient_errors += 1;
    }

    pub fn mark_done(&mut self) {
        self.transition(PollSessionState::Done);
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.transition(PollSessionState::Failed {
            reason: reason.into(),
        });
    }

    pub fn mark_timed_out(&mut self) {
        self.transition(PollSessionState::TimedOut);
    }

    pub fn mark_cancelled(&mut self) {
        self.transition(PollSessionState::Cancelled);
    }

    fn transition(&mut self, next: PollSessionState) {
        if !self.state.is_terminal() {
            self.state = next;
        }
    }

    pub fn strategy(&self) -> PollStrategy {
        self.strategy
    }

    pub fn cache_key(&self) -> &CacheKey {
        &self.cache_key
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn transient_errors(&self) -> u32 {
        self.transient_errors
    }

    pub fn waited(&self) -> Duration {
        self.waited
    }

    pub fn state(&self) -> &PollSessionState {
        &self.state
    }
}
