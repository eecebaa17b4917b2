//! Use cases (application services)
//!
//! - [`await_analysis`]: submit an analysis and poll for its result
//! - [`poll_until`]: the bounded poll loop both strategies share
//! - [`session_registry`]: one poll loop per cache key

pub mod await_analysis;
pub mod poll_until;
pub mod session_registry;
pub(crate) mod shared;
