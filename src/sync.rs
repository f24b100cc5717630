//! Reconciliation: watch source, pipeline, publishing, and import/export services.

mod events;
mod pipeline;
mod publish;
mod service;
pub mod source;

pub use events::{
    default_ignore_patterns, FileEvent, FileEventKind, ScriptFileMatcher, WatchConfig,
    WatchMessage, SCRIPT_FILE_GLOBS,
};
pub use pipeline::{Pipeline, PipelineReport, PipelineState};
pub use publish::{ImportOptions, PublishMode, PublishOutcome, Publisher};
pub use service::ScriptSync;
pub use source::WatchHandle;
