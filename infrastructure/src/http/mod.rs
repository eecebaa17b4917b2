//! HTTP adapter for the analysis REST API

pub mod backend;
pub mod error;
pub mod protocol;

pub use backend::{DEFAULT_REQUEST_TIMEOUT, HttpAnalysisBackend, HttpBackendConfig};
pub use error::HttpError;
