//! Progress notification port
//!
//! Defines the interface for reporting progress while an analysis is
//! submitted and polled.

use careline_domain::{AnalysisError, AnalysisResult, CacheKey, PollSession};
use std::time::Duration;

/// Callback for progress updates during an analysis.
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (spinner, plain log lines, chat UI).
/// Every method defaults to a no-op.
pub trait PollProgressNotifier: Send + Sync {
    /// The request was accepted by the backend.
    fn on_submitted(&self, _cache_key: Option<&CacheKey>) {}

    /// Waiting resumed on an analysis submitted earlier.
    ///
    /// Defaults to [`on_submitted`](Self::on_submitted).
    fn on_resumed(&self, cache_key: Option<&CacheKey>) {
        self.on_submitted(cache_key);
    }

    /// The result came back on submission; nothing to poll.
    fn on_cache_hit(&self) {}

    /// One poll attempt finished with a non-terminal or terminal observation.
    fn on_poll_attempt(&self, _session: &PollSession, _observed: &str) {}

    /// A transport error was absorbed; the loop will retry after `retry_in`.
    fn on_transient_error(&self, _session: &PollSession, _error: &str, _retry_in: Duration) {}

    /// The analysis reached a terminal outcome.
    fn on_finished(&self, _outcome: &Result<AnalysisResult, AnalysisError>) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoPollProgress;

impl PollProgressNotifier for NoPollProgress {}
