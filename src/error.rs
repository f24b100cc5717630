//! Error types for script extraction, resolution and reconciliation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the remote script service.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Script already exists: {0}")]
    Conflict(String),

    #[error("Script not found: {0}")]
    NotFound(String),
}

/// Errors raised while working with script descriptors.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid descriptor JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Script body file {path} cannot be read: {source}")]
    MissingBodyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Expected exactly one script in collection, found {count}")]
    MissingSingleScript { count: usize },

    #[error("Script '{name}' failed validation: {}", reasons.join("; "))]
    ValidationRejected { name: String, reasons: Vec<String> },

    #[error("Publish failed: {0}")]
    Publish(#[from] RemoteError),

    #[error("Script '{name}' body cannot be decoded: {reason}")]
    Decode { name: String, reason: String },

    #[error("Script '{name}' references an external body file and has no inline source")]
    NotInline { name: String },

    #[error("Scripts '{first}' and '{second}' both export to {path}")]
    DuplicateFileName {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("Watch setup failed: {0}")]
    WatchSetup(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScriptError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScriptError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-friendly label used in progress reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ScriptError::Io { .. } => "io_failure",
            ScriptError::Json { .. } => "invalid_json",
            ScriptError::MissingBodyFile { .. } => "missing_body_file",
            ScriptError::MissingSingleScript { .. } => "missing_single_script",
            ScriptError::ValidationRejected { .. } => "validation_rejected",
            ScriptError::Publish(_) => "publish_failure",
            ScriptError::Decode { .. } => "decode_failure",
            ScriptError::NotInline { .. } => "not_inline",
            ScriptError::DuplicateFileName { .. } => "duplicate_file_name",
            ScriptError::WatchSetup(_) => "watch_setup",
            ScriptError::Config(_) => "config",
        }
    }
}

impl From<config::ConfigError> for ScriptError {
    fn from(err: config::ConfigError) -> Self {
        ScriptError::Config(err.to_string())
    }
}
