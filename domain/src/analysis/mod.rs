//! Analysis subdomain.
//!
//! - [`request::AnalysisRequest`]: one submitted patient message
//! - [`handle::AnalysisHandle`]: what the backend returns on submission
//! - [`result::AnalysisResult`] / [`result::TaskState`]: what polling observes

pub mod handle;
pub mod request;
pub mod result;
