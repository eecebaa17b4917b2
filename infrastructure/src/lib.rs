//! Infrastructure layer for careline
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod http;
pub mod logging;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileBackendConfig, FileConfig, FileLoggingConfig,
    FileOutputConfig, FilePollingConfig,
};
pub use http::{HttpAnalysisBackend, HttpBackendConfig, HttpError};
pub use logging::JsonlAnalysisLogger;
