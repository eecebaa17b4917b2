//! CLI command definitions

use careline_domain::{AnalysisError, AnalysisHandle, AnalysisRequest, OutputFormat, PollStrategy, TaskId};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for analysis results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    /// The assistant message as plain text
    Text,
    /// Result or error as JSON
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => OutputFormat::Text,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Which polling loop to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StrategyArg {
    /// Task status when the backend returns a task id, cache key otherwise
    #[default]
    Auto,
    /// Watch job state, then read the result
    TaskStatus,
    /// Read the stored result directly
    CacheKey,
}

impl StrategyArg {
    pub fn to_strategy(self) -> Option<PollStrategy> {
        match self {
            Self::Auto => None,
            Self::TaskStatus => Some(PollStrategy::TaskStatus),
            Self::CacheKey => Some(PollStrategy::CacheKey),
        }
    }
}

/// What a single invocation does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Submit symptoms and wait for the analysis
    Submit(AnalysisRequest),
    /// Wait on an analysis submitted earlier
    Resume(AnalysisHandle),
}

/// CLI arguments for careline
#[derive(Parser, Debug)]
#[command(name = "careline")]
#[command(author, version, about = "Submit symptoms for analysis and wait for the result")]
#[command(long_about = r#"
Careline submits a symptom description to the analysis service and waits
for the assistant's answer.

Analyses run asynchronously on the server. When the service returns a task
id, careline watches the task state and fetches the result once it
succeeds; otherwise it polls the stored result by cache key. Both loops
are bounded. A timed-out analysis can be resumed later with
--resume-cache-key.

Configuration files are loaded from (in priority order):
1. CARELINE_* environment variables
2. --config <path>     Explicit config file
3. ./careline.toml     Project-level config
4. ~/.config/careline/config.toml   Global config

Example:
  careline -c conv-42 "Headache and mild fever since yesterday"
  careline --resume-cache-key 9f2c1e --resume-task-id 7d1a -o json
"#)]
pub struct Cli {
    /// Symptom description to analyze
    pub symptoms: Option<String>,

    /// Conversation the analysis belongs to (required to submit)
    #[arg(short, long, value_name = "ID")]
    pub conversation: Option<String>,

    /// Resume waiting on an earlier analysis instead of submitting
    #[arg(long, value_name = "KEY", conflicts_with = "symptoms")]
    pub resume_cache_key: Option<String>,

    /// Task id of the analysis being resumed
    #[arg(long, value_name = "ID", requires = "resume_cache_key")]
    pub resume_task_id: Option<String>,

    /// Polling strategy
    #[arg(long, value_enum, default_value = "auto")]
    pub strategy: StrategyArg,

    /// Output format (defaults to config, then text)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormatArg>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Write a daily-rotated tracing log into this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Append analysis events as JSON lines to this file
    #[arg(long, value_name = "PATH")]
    pub analysis_log: Option<PathBuf>,
}

impl Cli {
    /// Resolve the arguments into a submission or a resume.
    pub fn run_mode(&self) -> Result<RunMode, AnalysisError> {
        if let Some(cache_key) = &self.resume_cache_key {
            if cache_key.trim().is_empty() {
                return Err(AnalysisError::InvalidRequest(
                    "--resume-cache-key cannot be empty".to_string(),
                ));
            }
            let task_id = self
                .resume_task_id
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(TaskId::new);
            return Ok(RunMode::Resume(AnalysisHandle::pending(
                task_id,
                cache_key.trim(),
            )));
        }

        let symptoms = self.symptoms.as_deref().unwrap_or_default();
        let conversation = self.conversation.as_deref().unwrap_or_default();
        AnalysisRequest::new(symptoms, conversation).map(RunMode::Submit)
    }
}
