//! Structured analysis logging.
//!
//! Provides [`JsonlAnalysisLogger`], a JSONL file writer that implements
//! the [`AnalysisLogger`](careline_application::AnalysisLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlAnalysisLogger;
