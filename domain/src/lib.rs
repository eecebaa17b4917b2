//! Domain layer for careline
//!
//! This crate contains the value objects and state machines behind AI
//! symptom analysis. It has no dependencies on infrastructure or
//! presentation concerns, and no async runtime.
//!
//! # Core Concepts
//!
//! ## Analysis
//!
//! A patient message is submitted as an [`AnalysisRequest`]. The backend
//! answers with an [`AnalysisHandle`]: either the finished
//! [`AnalysisResult`] (cache hit) or the identifiers needed to poll for it.
//!
//! ## Polling
//!
//! - **Task-status polling**: follow a job-queue [`TaskState`] until `SUCCESS`,
//!   then fetch the result by [`CacheKey`]
//! - **Cache-key polling**: read the stored result directly until it is `done`
//!
//! Each polling loop is tracked by a [`PollSession`] and bounded by a
//! [`PollPolicy`].

pub mod analysis;
pub mod config;
pub mod core;
pub mod polling;
pub mod util;

// Re-export commonly used types
pub use analysis::{
    handle::AnalysisHandle,
    request::AnalysisRequest,
    result::{AnalysisResult, AnalysisStatus, TaskState},
};
pub use config::OutputFormat;
pub use core::{
    error::{AnalysisError, AnalysisErrorKind},
    ids::{CacheKey, ConversationId, TaskId},
};
pub use polling::{
    policy::{PollPolicy, PollStrategy},
    session::{PollSession, PollSessionState},
    verdict::PollVerdict,
};
