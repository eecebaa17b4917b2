//! Progress reporting while an analysis is polled

use careline_application::PollProgressNotifier;
use careline_domain::{AnalysisError, AnalysisResult, CacheKey, PollSession};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress on stderr with a spinner
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn with_spinner(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.spinner.lock()
            && let Some(pb) = guard.as_ref()
        {
            f(pb);
        }
    }

    fn start_spinner(&self, prefix: &'static str, message: String) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix(prefix);
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut guard) = self.spinner.lock()
            && let Some(previous) = guard.replace(pb)
        {
            previous.finish_and_clear();
        }
    }

    fn key_message(action: &str, cache_key: Option<&CacheKey>) -> String {
        match cache_key {
            Some(key) => format!("{} ({})", action, key),
            None => action.to_string(),
        }
    }

    fn attempt_prefix(session: &PollSession) -> String {
        format!("[{}/{}]", session.attempts(), session.max_attempts())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PollProgressNotifier for ProgressReporter {
    fn on_submitted(&self, cache_key: Option<&CacheKey>) {
        self.start_spinner("Analyzing", Self::key_message("submitted", cache_key));
    }

    fn on_resumed(&self, cache_key: Option<&CacheKey>) {
        self.start_spinner("Resuming", Self::key_message("waiting", cache_key));
    }

    fn on_cache_hit(&self) {
        self.with_spinner(|pb| pb.set_message("cached result".green().to_string()));
    }

    fn on_poll_attempt(&self, session: &PollSession, observed: &str) {
        self.with_spinner(|pb| {
            pb.set_prefix(Self::attempt_prefix(session));
            pb.set_message(format!("{} via {}", observed, session.strategy()));
        });
    }

    fn on_transient_error(&self, session: &PollSession, error: &str, retry_in: Duration) {
        self.with_spinner(|pb| {
            pb.set_prefix(Self::attempt_prefix(session));
            pb.set_message(format!(
                "{} {} (retrying in {:.1}s)",
                "!".yellow(),
                error,
                retry_in.as_secs_f32()
            ));
        });
    }

    fn on_finished(&self, _outcome: &Result<AnalysisResult, AnalysisError>) {
        if let Ok(mut guard) = self.spinner.lock()
            && let Some(pb) = guard.take()
        {
            pb.finish_and_clear();
        }
    }
}

/// Plain line-per-event progress on stderr (no spinner)
pub struct SimpleProgress;

impl PollProgressNotifier for SimpleProgress {
    fn on_submitted(&self, cache_key: Option<&CacheKey>) {
        match cache_key {
            Some(key) => eprintln!("{} submitted ({})", "->".cyan(), key),
            None => eprintln!("{} submitted", "->".cyan()),
        }
    }

    fn on_resumed(&self, cache_key: Option<&CacheKey>) {
        eprintln!(
            "{} {}",
            "->".cyan(),
            ProgressReporter::key_message("resuming", cache_key)
        );
    }

    fn on_cache_hit(&self) {
        eprintln!("  {} cached result", "v".green());
    }

    fn on_poll_attempt(&self, session: &PollSession, observed: &str) {
        eprintln!(
            "  {} {}",
            ProgressReporter::attempt_prefix(session).dimmed(),
            observed
        );
    }

    fn on_transient_error(&self, session: &PollSession, error: &str, retry_in: Duration) {
        eprintln!(
            "  {} {} {} (retrying in {:.1}s)",
            ProgressReporter::attempt_prefix(session).dimmed(),
            "!".yellow(),
            error,
            retry_in.as_secs_f32()
        );
    }

    fn on_finished(&self, outcome: &Result<AnalysisResult, AnalysisError>) {
        match outcome {
            Ok(_) => eprintln!("  {} done", "v".green()),
            Err(e) => eprintln!("  {} {}", "x".red(), e.kind()),
        }
    }
}
