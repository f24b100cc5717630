//! Reconciliation pipeline: turns file events into remote publishes.
//!
//! One task consumes the watch channel and fully handles each event
//! (resolve, materialize, publish) before receiving the next, so two events
//! for the same script never race. Per-event failures are reported and
//! counted; only setup errors and cancellation end a run.

use super::events::{FileEvent, WatchMessage};
use super::publish::{ImportOptions, PublishMode, PublishOutcome, Publisher};
use crate::error::ScriptError;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::script::Resolver;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Pipeline lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Scanning,
    Watching,
    Done,
    Stopped,
}

/// Counters for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub matched: usize,
    pub created: usize,
    pub updated: usize,
    pub rejected: usize,
    pub failed: usize,
    pub skipped: usize,
    pub state: PipelineState,
}

impl Default for PipelineReport {
    fn default() -> Self {
        Self {
            matched: 0,
            created: 0,
            updated: 0,
            rejected: 0,
            failed: 0,
            skipped: 0,
            state: PipelineState::Idle,
        }
    }
}

impl PipelineReport {
    pub fn published(&self) -> usize {
        self.created + self.updated
    }

    pub fn summary(&self) -> String {
        if self.matched == 0 && self.published() == 0 && self.failed == 0 {
            return "Nothing to do".to_string();
        }
        format!(
            "Published {} script(s) ({} created, {} updated), {} rejected, {} failed",
            self.published(),
            self.created,
            self.updated,
            self.rejected,
            self.failed
        )
    }
}

pub struct Pipeline {
    resolver: Resolver,
    publisher: Publisher,
    options: ImportOptions,
    mode: PublishMode,
    progress: Arc<dyn ProgressSink>,
}

impl Pipeline {
    pub fn new(
        resolver: Resolver,
        publisher: Publisher,
        options: ImportOptions,
        persistent: bool,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        let mode = if persistent {
            PublishMode::Watch
        } else {
            PublishMode::OneShot
        };
        if mode == PublishMode::Watch && options.regenerate_ids {
            warn!("Ignoring id regeneration in watch mode; script ids stay stable across saves");
        }
        Self {
            resolver,
            publisher,
            options: options.effective(mode),
            mode,
            progress,
        }
    }

    pub fn mode(&self) -> PublishMode {
        self.mode
    }

    /// Consume watch messages until the run ends.
    ///
    /// One-shot runs end with [`PipelineState::Done`] once the initial scan has
    /// been processed. Watch runs end with [`PipelineState::Stopped`] when
    /// `shutdown` flips to `true` or the source closes; the event in flight is
    /// always finished first.
    pub async fn run(
        &self,
        root: &Path,
        mut events: mpsc::Receiver<WatchMessage>,
        mut shutdown: Option<watch::Receiver<bool>>,
    ) -> PipelineReport {
        let persistent = self.mode == PublishMode::Watch;
        let mut report = PipelineReport {
            state: PipelineState::Scanning,
            ..PipelineReport::default()
        };
        self.progress.report(ProgressEvent::WatchStarted {
            root: root.to_path_buf(),
            persistent,
        });

        loop {
            let message = tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => {
                    events.close();
                    report.state = PipelineState::Stopped;
                    break;
                }
                message = events.recv() => message,
            };

            match message {
                Some(WatchMessage::File(event)) => self.process(&event, &mut report).await,
                Some(WatchMessage::ScanComplete { matched }) => {
                    report.matched = matched;
                    self.progress.report(ProgressEvent::ScanComplete { matched });
                    if matched == 0 {
                        self.progress.report(ProgressEvent::NothingToDo {
                            root: root.to_path_buf(),
                        });
                    }
                    if !persistent {
                        report.state = PipelineState::Done;
                        break;
                    }
                    report.state = PipelineState::Watching;
                    info!(root = %root.display(), "Initial scan reconciled; watching for changes");
                }
                Some(WatchMessage::Error(message)) => {
                    warn!("Watch error: {}", message);
                }
                None => {
                    report.state = if persistent {
                        PipelineState::Stopped
                    } else {
                        PipelineState::Done
                    };
                    break;
                }
            }
        }

        if report.state == PipelineState::Stopped {
            self.progress.report(ProgressEvent::Stopped);
        }
        info!(
            created = report.created,
            updated = report.updated,
            rejected = report.rejected,
            failed = report.failed,
            "Reconciliation finished"
        );
        report
    }

    async fn process(&self, event: &FileEvent, report: &mut PipelineReport) {
        let Some(descriptor_path) = self.resolver.owning_descriptor(&event.path) else {
            report.skipped += 1;
            self.progress.report(ProgressEvent::Skipped {
                path: event.path.clone(),
            });
            return;
        };
        debug!(
            path = %event.path.display(),
            kind = ?event.kind,
            descriptor = %descriptor_path.display(),
            "Processing script event"
        );

        match self.reconcile(&descriptor_path).await {
            Ok(outcome) => {
                if outcome.is_created() {
                    report.created += 1;
                } else {
                    report.updated += 1;
                }
                self.progress.report(ProgressEvent::Published {
                    path: descriptor_path,
                    id: outcome.id().to_string(),
                    created: outcome.is_created(),
                });
            }
            Err(ScriptError::ValidationRejected { reasons, .. }) => {
                report.rejected += 1;
                self.progress.report(ProgressEvent::Rejected {
                    path: descriptor_path,
                    reasons,
                });
            }
            Err(e) => {
                report.failed += 1;
                self.progress.report(ProgressEvent::Failed {
                    path: descriptor_path,
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    /// Resolve, materialize and publish one descriptor file.
    pub async fn reconcile(&self, descriptor_path: &Path) -> Result<PublishOutcome, ScriptError> {
        let descriptor = self.resolver.materialize(descriptor_path)?;
        self.publisher
            .publish(descriptor, self.options, self.mode)
            .await
    }
}

/// Resolves once shutdown is requested; never resolves without a receiver.
async fn wait_for_shutdown(shutdown: &mut Option<watch::Receiver<bool>>) {
    let Some(rx) = shutdown.as_mut() else {
        return std::future::pending().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}
