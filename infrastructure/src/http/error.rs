//! Error types for the HTTP backend adapter

use careline_application::BackendError;
use thiserror::Error;

/// Result type alias for HTTP adapter operations
pub type Result<T> = std::result::Result<T, HttpError>;

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Errors that can occur when talking to the analysis REST API
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid API token: {0}")]
    InvalidToken(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {error}\nRaw response: {raw}")]
    ParseError { error: String, raw: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl HttpError {
    pub(crate) fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: truncate_body(body),
        }
    }
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

impl From<HttpError> for BackendError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::Request(e) if e.is_timeout() => BackendError::Timeout,
            HttpError::Request(e) if e.is_connect() => BackendError::ConnectionError(e.to_string()),
            HttpError::Request(e) => BackendError::Other(e.to_string()),
            HttpError::Status { status, body } => BackendError::Status { status, body },
            HttpError::ParseError { error, .. } => BackendError::Decode(error),
            HttpError::UnexpectedResponse(msg) => BackendError::Decode(msg),
            e @ (HttpError::InvalidUrl { .. } | HttpError::InvalidToken(_)) => {
                BackendError::Other(e.to_string())
            }
        }
    }
}
