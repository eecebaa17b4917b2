//! Port for structured analysis logging.
//!
//! Defines the [`AnalysisLogger`] trait for recording analysis lifecycle
//! events (submission, each poll attempt, terminal outcome) to a
//! machine-readable log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, this port captures one record per event.

use serde_json::Value;

/// A structured analysis event for logging.
pub struct AnalysisEvent {
    /// Event type identifier (e.g., "analysis_submitted", "poll_attempt").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl AnalysisEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging analysis events.
///
/// `log` is synchronous and infallible; a logging failure must never
/// disturb a poll loop.
pub trait AnalysisLogger: Send + Sync {
    fn log(&self, event: AnalysisEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoAnalysisLogger;

impl AnalysisLogger for NoAnalysisLogger {
    fn log(&self, _event: AnalysisEvent) {}
}
