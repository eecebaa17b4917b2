//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation
//! adapters must implement.

pub mod analysis_backend;
pub mod analysis_logger;
pub mod progress;
