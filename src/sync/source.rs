//! Watch source: initial directory scan plus filesystem notifications, both
//! feeding one bounded channel consumed by the pipeline.

use super::events::{FileEvent, FileEventKind, ScriptFileMatcher, WatchConfig, WatchMessage};
use crate::error::ScriptError;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Running watch source. Dropping it stops filesystem notifications.
pub struct WatchHandle {
    pub receiver: mpsc::Receiver<WatchMessage>,
    root: PathBuf,
    _watcher: Option<RecommendedWatcher>,
    _scanner: JoinHandle<()>,
}

impl WatchHandle {
    /// Canonical root the source is watching.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

/// Start scanning (and, when persistent, watching) `config.root`.
///
/// Fails only on setup problems: a missing root or a watcher that cannot start.
pub fn start(config: &WatchConfig) -> Result<WatchHandle, ScriptError> {
    let root = dunce::canonicalize(&config.root).map_err(|e| {
        ScriptError::WatchSetup(format!(
            "Watch root {} is not accessible: {}",
            config.root.display(),
            e
        ))
    })?;
    if !root.is_dir() {
        return Err(ScriptError::WatchSetup(format!(
            "Watch root {} is not a directory",
            root.display()
        )));
    }

    let matcher = ScriptFileMatcher::new(root.clone(), &config.ignore_patterns)?;
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));

    let watcher = if config.persistent {
        let notify_tx = tx.clone();
        let notify_matcher = matcher.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let messages = match res {
                Ok(event) => convert_event(event, &notify_matcher),
                Err(e) => vec![WatchMessage::Error(e.to_string())],
            };
            for message in messages {
                if let Err(e) = notify_tx.blocking_send(message) {
                    error!("Error sending watch event: {}", e);
                    return;
                }
            }
        })
        .map_err(|e| ScriptError::WatchSetup(format!("Failed to create watcher: {}", e)))?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| ScriptError::WatchSetup(format!("Failed to watch directory: {}", e)))?;
        info!(root = %root.display(), "Watching script directory");
        Some(watcher)
    } else {
        None
    };

    let scan_root = root.clone();
    let scanner = std::thread::Builder::new()
        .name("scriptsync-scan".to_string())
        .spawn(move || scan(&scan_root, &matcher, tx))
        .map_err(|e| ScriptError::WatchSetup(format!("Failed to start scanner: {}", e)))?;

    Ok(WatchHandle {
        receiver: rx,
        root,
        _watcher: watcher,
        _scanner: scanner,
    })
}

fn scan(root: &std::path::Path, matcher: &ScriptFileMatcher, tx: mpsc::Sender<WatchMessage>) {
    let mut matched = 0usize;
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !matcher.is_ignored(entry.path()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read directory entry during scan: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !matcher.matches(entry.path()) {
            continue;
        }
        matched += 1;
        debug!(path = %entry.path().display(), "Scan matched script file");
        if tx
            .blocking_send(WatchMessage::File(FileEvent::added(entry.path())))
            .is_err()
        {
            return;
        }
    }

    let _ = tx.blocking_send(WatchMessage::ScanComplete { matched });
}

/// Map a notify event to file events. Removals and access events are dropped;
/// a rename contributes its destination.
fn convert_event(event: Event, matcher: &ScriptFileMatcher) -> Vec<WatchMessage> {
    let kind = match event.kind {
        EventKind::Create(_) => FileEventKind::Added,
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(ModifyKind::Name(_)) => {
            return event
                .paths
                .last()
                .filter(|p| p.is_file() && matcher.matches(p))
                .map(|p| vec![WatchMessage::File(FileEvent::added(p.clone()))])
                .unwrap_or_default();
        }
        EventKind::Modify(_) => FileEventKind::Changed,
        _ => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .filter(|p| matcher.matches(p))
        .map(|path| WatchMessage::File(FileEvent { path, kind }))
        .collect()
}
