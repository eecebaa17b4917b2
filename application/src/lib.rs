//! Application layer for careline
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::PollingParams;
pub use ports::{
    analysis_backend::{AnalysisBackend, BackendError},
    analysis_logger::{AnalysisEvent, AnalysisLogger, NoAnalysisLogger},
    progress::{NoPollProgress, PollProgressNotifier},
};
pub use use_cases::await_analysis::AwaitAnalysisUseCase;
pub use use_cases::poll_until::{PollHooks, poll_until};
pub use use_cases::session_registry::{ActiveSessions, SessionGuard};
