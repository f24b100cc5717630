//! Watch events, file matching, and configuration.

use crate::error::ScriptError;
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};

/// File-name globs for the descriptor file and both body extensions.
pub const SCRIPT_FILE_GLOBS: [&str; 3] = ["*.script.json", "*.script.js", "*.script.groovy"];

/// Watch mode configuration
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Directory tree to reconcile
    pub root: PathBuf,
    /// Keep listening after the initial scan
    pub persistent: bool,
    /// Bound of the channel between the watch source and the pipeline
    pub channel_capacity: usize,
    /// Ignore patterns (glob patterns, relative to `root`)
    pub ignore_patterns: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            persistent: false,
            channel_capacity: 256,
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

pub fn default_ignore_patterns() -> Vec<String> {
    vec![
        "**/.git/**".to_string(),
        "**/node_modules/**".to_string(),
        "**/*.swp".to_string(),
        "**/*~".to_string(),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventKind {
    Added,
    Changed,
}

/// A descriptor or body file appeared or changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: FileEventKind,
}

impl FileEvent {
    pub fn added(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: FileEventKind::Added,
        }
    }

    pub fn changed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: FileEventKind::Changed,
        }
    }
}

/// Messages delivered from the watch source to the pipeline, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchMessage {
    File(FileEvent),
    /// Every file present at start has been delivered.
    ScanComplete { matched: usize },
    /// Non-fatal watcher error.
    Error(String),
}

/// Decides which paths the pipeline cares about.
#[derive(Debug, Clone)]
pub struct ScriptFileMatcher {
    root: PathBuf,
    include: Vec<Pattern>,
    ignore: Vec<Pattern>,
}

impl ScriptFileMatcher {
    pub fn new(root: impl Into<PathBuf>, ignore_patterns: &[String]) -> Result<Self, ScriptError> {
        let compile = |p: &str| {
            Pattern::new(p)
                .map_err(|e| ScriptError::Config(format!("Invalid glob pattern '{}': {}", p, e)))
        };
        Ok(Self {
            root: root.into(),
            include: SCRIPT_FILE_GLOBS
                .iter()
                .map(|p| compile(p))
                .collect::<Result<_, _>>()?,
            ignore: ignore_patterns
                .iter()
                .map(|p| compile(p))
                .collect::<Result<_, _>>()?,
        })
    }

    /// File name matches one of the script globs and the path is not ignored.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if !self.include.iter().any(|p| p.matches(name)) {
            return false;
        }
        !self.is_ignored(path)
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };
        self.ignore
            .iter()
            .any(|p| p.matches_path_with(relative, options))
    }
}
