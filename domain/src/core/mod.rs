//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: backend identifiers ([`ids::ConversationId`], [`ids::TaskId`], [`ids::CacheKey`])
//! - [`error::AnalysisError`]: terminal errors surfaced to callers

pub mod error;
pub mod ids;
