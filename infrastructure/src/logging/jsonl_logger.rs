//! Append-only JSONL analysis log.
//!
//! One line per [`AnalysisEvent`]:
//!
//! ```text
//! {"ts": "...", "run": "4211-20261017T091502", "seq": 3, "event": "poll_attempt",
//!  "cache_key": "k-1", "strategy": "cache_key", "data": {"attempt": 2, ...}}
//! ```
//!
//! `cache_key` and `strategy` are lifted out of the payload to the top
//! level. `run` identifies one invocation and `seq` orders records within it.

use careline_application::{AnalysisEvent, AnalysisLogger};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::warn;

/// Payload keys promoted to top-level record fields.
const CACHE_KEY_FIELD: &str = "cache_key";
const STRATEGY_FIELD: &str = "strategy";

#[derive(Debug, Serialize)]
struct LogRecord<'a> {
    ts: String,
    run: &'a str,
    seq: u64,
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strategy: Option<String>,
    #[serde(skip_serializing_if = "is_empty_data")]
    data: Value,
}

fn is_empty_data(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Remove `key` from the payload when it holds a string.
fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => {
            map.insert(key.to_string(), other);
            None
        }
    }
}

fn run_id() -> String {
    format!(
        "{}-{}",
        std::process::id(),
        chrono::Utc::now().format("%Y%m%dT%H%M%S")
    )
}

/// [`AnalysisLogger`] writing [`LogRecord`] lines to an append-mode file.
pub struct JsonlAnalysisLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    run: String,
    seq: AtomicU64,
    write_failed: AtomicBool,
}

impl JsonlAnalysisLogger {
    /// Open (or create) the log at `path`, creating parent directories.
    ///
    /// Returns `None` if the file cannot be opened; the caller runs without
    /// an analysis log in that case.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        match open_append(path) {
            Ok(file) => Some(Self {
                writer: Mutex::new(BufWriter::new(file)),
                path: path.to_path_buf(),
                run: run_id(),
                seq: AtomicU64::new(0),
                write_failed: AtomicBool::new(false),
            }),
            Err(e) => {
                warn!("Analysis log disabled, cannot open {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record<'a>(&'a self, event: &'a AnalysisEvent) -> LogRecord<'a> {
        let (cache_key, strategy, data) = match &event.payload {
            Value::Object(map) => {
                let mut map = map.clone();
                let cache_key = take_string(&mut map, CACHE_KEY_FIELD);
                let strategy = take_string(&mut map, STRATEGY_FIELD);
                (cache_key, strategy, Value::Object(map))
            }
            other => (None, None, other.clone()),
        };

        LogRecord {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            run: &self.run,
            seq: self.seq.fetch_add(1, Ordering::Relaxed) + 1,
            event: event.event_type,
            cache_key,
            strategy,
            data,
        }
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("analysis log writer poisoned"))?;
        writeln!(writer, "{}", line)?;
        writer.flush()
    }

    /// Report the first write failure only; later ones are dropped quietly.
    fn report_failure(&self, error: impl std::fmt::Display) {
        if !self.write_failed.swap(true, Ordering::Relaxed) {
            warn!("Failed to write analysis log {}: {}", self.path.display(), error);
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

impl AnalysisLogger for JsonlAnalysisLogger {
    fn log(&self, event: AnalysisEvent) {
        let record = self.record(&event);
        let result = serde_json::to_string(&record)
            .map_err(io::Error::from)
            .and_then(|line| self.write_line(&line));
        if let Err(e) = result {
            self.report_failure(e);
        }
    }
}

impl Drop for JsonlAnalysisLogger {
    fn drop(&mut self) {
        let flushed = match self.writer.get_mut() {
            Ok(writer) => writer.flush(),
            Err(_) => return,
        };
        if let Err(e) = flushed {
            self.report_failure(e);
        }
    }
}
