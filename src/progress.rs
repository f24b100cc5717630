//! Progress reporting
//!
//! The reconciliation pipeline reports every outcome through a [`ProgressSink`].
//! Sinks are best-effort: reporting never fails the operation being reported.

use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::fmt;
use std::path::PathBuf;

/// Human-facing status events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    WatchStarted { root: PathBuf, persistent: bool },
    ScanComplete { matched: usize },
    Published { path: PathBuf, id: String, created: bool },
    Rejected { path: PathBuf, reasons: Vec<String> },
    Failed { path: PathBuf, kind: String, message: String },
    Skipped { path: PathBuf },
    NothingToDo { root: PathBuf },
    Stopped,
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::WatchStarted { root, persistent } => {
                if *persistent {
                    write!(f, "Watching {} for script changes", root.display())
                } else {
                    write!(f, "Importing scripts from {}", root.display())
                }
            }
            ProgressEvent::ScanComplete { matched } => {
                write!(f, "Initial scan found {} script file(s)", matched)
            }
            ProgressEvent::Published { path, id, created } => write!(
                f,
                "{} {} ({})",
                if *created { "Created" } else { "Updated" },
                path.display(),
                id
            ),
            ProgressEvent::Rejected { path, reasons } => write!(
                f,
                "Rejected {}: {}",
                path.display(),
                reasons.join("; ")
            ),
            ProgressEvent::Failed {
                path,
                kind,
                message,
            } => write!(f, "Failed {} [{}]: {}", path.display(), kind, message),
            ProgressEvent::Skipped { path } => write!(f, "Skipped {}", path.display()),
            ProgressEvent::NothingToDo { root } => {
                write!(f, "Nothing to do: no script files under {}", root.display())
            }
            ProgressEvent::Stopped => write!(f, "Stopped watching"),
        }
    }
}

/// Sink for progress events.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Colored, timestamped status lines on stderr. Also mirrored to tracing.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    color: bool,
}

impl ConsoleProgress {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl ProgressSink for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        let stamp = chrono::Local::now().format("%H:%M:%S").to_string();
        let line = event.to_string();
        let rendered = if !self.color {
            line
        } else {
            match &event {
                ProgressEvent::Published { .. } => line.green().to_string(),
                ProgressEvent::Rejected { .. } | ProgressEvent::Skipped { .. } => {
                    line.yellow().to_string()
                }
                ProgressEvent::Failed { .. } => line.red().to_string(),
                _ => line.bold().to_string(),
            }
        };
        eprintln!("[{}] {}", stamp, rendered);

        match &event {
            ProgressEvent::Failed { path, kind, message } => {
                tracing::warn!(path = %path.display(), kind = %kind, error = %message, "Script event failed")
            }
            ProgressEvent::Rejected { path, .. } => {
                tracing::warn!(path = %path.display(), "Script rejected by validation")
            }
            other => tracing::info!("{}", other),
        }
    }
}

/// Tracing-only sink for non-interactive runs.
#[derive(Debug, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, event: ProgressEvent) {
        tracing::info!(target: "scriptsync::progress", "{}", event);
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().push(event);
    }
}
