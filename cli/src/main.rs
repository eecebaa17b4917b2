//! CLI entrypoint for careline
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use careline_application::{
    AnalysisLogger, AwaitAnalysisUseCase, NoPollProgress, PollProgressNotifier,
};
use careline_domain::{AnalysisError, AnalysisErrorKind, OutputFormat};
use careline_infrastructure::{ConfigLoader, FileConfig, HttpAnalysisBackend, JsonlAnalysisLogger};
use careline_presentation::{Cli, ConsoleFormatter, ProgressReporter, RunMode, SimpleProgress};
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    config.validate().context("Invalid configuration")?;

    let log_dir = cli
        .log_dir
        .clone()
        .or_else(|| config.logging.log_dir.as_ref().map(PathBuf::from));
    let _log_guard = init_tracing(cli.verbose, log_dir.as_deref());

    if !config.output.color {
        colored::control::set_override(false);
    }

    let format: OutputFormat = cli
        .output
        .map(OutputFormat::from)
        .or(config.output.format)
        .unwrap_or_default();

    let mode = match cli.run_mode() {
        Ok(mode) => mode,
        Err(e) => return Ok(report_error(&e, format)),
    };

    info!("Starting careline");

    // === Dependency Injection ===
    let backend = Arc::new(HttpAnalysisBackend::new(config.to_backend_config())?);

    let cancellation = CancellationToken::new();
    tokio::spawn({
        let token = cancellation.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling analysis");
                token.cancel();
            }
        }
    });

    let mut use_case = AwaitAnalysisUseCase::new(backend)
        .with_params(config.polling.to_polling_params())
        .with_strategy(cli.strategy.to_strategy())
        .with_cancellation(cancellation);

    if let Some(logger) = analysis_logger(&cli, &config) {
        use_case = use_case.with_logger(logger);
    }

    let progress: Box<dyn PollProgressNotifier> = if cli.quiet {
        Box::new(NoPollProgress)
    } else if std::io::stderr().is_terminal() {
        Box::new(ProgressReporter::new())
    } else {
        Box::new(SimpleProgress)
    };

    let outcome = match mode {
        RunMode::Submit(request) => use_case.submit_and_await(&request, progress.as_ref()).await,
        RunMode::Resume(handle) => use_case.await_handle(handle, progress.as_ref()).await,
    };

    match outcome {
        Ok(result) => {
            print!("{}", ConsoleFormatter::format_result(&result, format));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report_error(&e, format)),
    }
}

/// Initialize tracing on stderr, plus a daily-rotated file under `log_dir`.
///
/// The returned guard flushes the file writer on drop.
fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "careline.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    guard
}

fn analysis_logger(cli: &Cli, config: &FileConfig) -> Option<Arc<dyn AnalysisLogger>> {
    let path = cli
        .analysis_log
        .clone()
        .or_else(|| config.logging.analysis_log.as_ref().map(PathBuf::from))?;
    let logger = JsonlAnalysisLogger::new(&path)?;
    info!("Writing analysis log to {}", logger.path().display());
    Some(Arc::new(logger))
}

/// Print `error` in the requested format and pick the exit code.
fn report_error(error: &AnalysisError, format: OutputFormat) -> ExitCode {
    let output = ConsoleFormatter::format_error(error, format);
    match format {
        OutputFormat::Json => println!("{}", output),
        OutputFormat::Text => eprint!("{}", output),
    }

    match error.kind() {
        AnalysisErrorKind::Cancelled => ExitCode::from(130),
        AnalysisErrorKind::InvalidRequest => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}
