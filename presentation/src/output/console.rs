//! Console output for analysis results and errors

use careline_domain::{AnalysisError, AnalysisErrorKind, AnalysisResult, OutputFormat};
use colored::Colorize;

/// Formats analysis outcomes for the terminal
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a finished analysis
    pub fn format_result(result: &AnalysisResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => Self::format_text(result),
            OutputFormat::Json => Self::format_json(result),
        }
    }

    /// Format a failed analysis
    pub fn format_error(error: &AnalysisError, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => Self::format_error_text(error),
            OutputFormat::Json => Self::format_error_json(error),
        }
    }

    /// The assistant message, trimmed, with a trailing newline
    pub fn format_text(result: &AnalysisResult) -> String {
        format!("{}\n", result.text().trim())
    }

    pub fn format_json(result: &AnalysisResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_error_text(error: &AnalysisError) -> String {
        format!(
            "{} {}\n{}\n",
            "x".red().bold(),
            Self::user_message(error).bold(),
            error.to_string().dimmed()
        )
    }

    fn format_error_json(error: &AnalysisError) -> String {
        let value = serde_json::json!({
            "error": {
                "kind": error.kind(),
                "message": Self::user_message(error),
                "detail": error.to_string(),
            }
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    /// User-facing copy for each error kind
    pub fn user_message(error: &AnalysisError) -> String {
        match error.kind() {
            AnalysisErrorKind::Failure => "The analysis failed, please retry.".to_string(),
            AnalysisErrorKind::Timeout => {
                "The analysis is taking longer than expected, check back later.".to_string()
            }
            AnalysisErrorKind::Network => "Could not reach the server.".to_string(),
            AnalysisErrorKind::Cancelled => "Cancelled.".to_string(),
            AnalysisErrorKind::DuplicateSession => {
                "This analysis is already being awaited.".to_string()
            }
            AnalysisErrorKind::InvalidRequest => match error {
                AnalysisError::InvalidRequest(msg) => format!("Invalid request: {}", msg),
                _ => "Invalid request.".to_string(),
            },
        }
    }
}
