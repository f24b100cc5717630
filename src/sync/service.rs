//! Import/export orchestration over the extract/resolve core and a remote service.

use super::events::WatchConfig;
use super::pipeline::{Pipeline, PipelineReport};
use super::publish::{ImportOptions, PublishMode, PublishOutcome, Publisher};
use super::source;
use crate::error::{RemoteError, ScriptError};
use crate::progress::ProgressSink;
use crate::remote::ScriptService;
use crate::script::{
    load_collection, write_collection, DescriptorCollection, ExtractedPair, Extractor, Resolver,
    ScriptDescriptor,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Entry point used by the command layer.
pub struct ScriptSync {
    base_dir: PathBuf,
    publisher: Publisher,
    progress: Arc<dyn ProgressSink>,
    watch_defaults: WatchConfig,
}

impl ScriptSync {
    /// `base_dir` anchors relative `file://` references and relative targets.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        service: Arc<dyn ScriptService>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            publisher: Publisher::new(service),
            progress,
            watch_defaults: WatchConfig::default(),
        }
    }

    /// Channel capacity and ignore patterns for directory runs.
    pub fn with_watch_defaults(mut self, defaults: WatchConfig) -> Self {
        self.watch_defaults = defaults;
        self
    }

    fn resolver(&self) -> Resolver {
        Resolver::new(self.base_dir.clone())
    }

    fn extractor(&self) -> Extractor {
        Extractor::new(self.base_dir.clone())
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Publish one descriptor (or body) file. Errors propagate to the caller.
    pub async fn import_file(
        &self,
        path: &Path,
        options: ImportOptions,
    ) -> Result<PublishOutcome, ScriptError> {
        let path = self.absolute(path);
        let resolver = self.resolver();
        let descriptor_path = resolver.owning_descriptor(&path).unwrap_or(path);
        let descriptor = resolver.materialize(&descriptor_path)?;
        let outcome = self
            .publisher
            .publish(descriptor, options, PublishMode::OneShot)
            .await?;
        info!(path = %descriptor_path.display(), id = %outcome.id(), "Imported script");
        Ok(outcome)
    }

    /// Publish every pair under `root` once.
    pub async fn import_directory(
        &self,
        root: &Path,
        options: ImportOptions,
    ) -> Result<PipelineReport, ScriptError> {
        self.run_pipeline(root, options, false, None).await
    }

    /// Publish every pair under `root`, then keep publishing changes until
    /// `shutdown` becomes `true`.
    pub async fn watch_directory(
        &self,
        root: &Path,
        options: ImportOptions,
        shutdown: watch::Receiver<bool>,
    ) -> Result<PipelineReport, ScriptError> {
        self.run_pipeline(root, options, true, Some(shutdown)).await
    }

    async fn run_pipeline(
        &self,
        root: &Path,
        options: ImportOptions,
        persistent: bool,
        shutdown: Option<watch::Receiver<bool>>,
    ) -> Result<PipelineReport, ScriptError> {
        let config = WatchConfig {
            root: self.absolute(root),
            persistent,
            ..self.watch_defaults.clone()
        };
        let handle = source::start(&config)?;
        let root = handle.root().to_path_buf();
        let pipeline = Pipeline::new(
            self.resolver(),
            self.publisher.clone(),
            options,
            persistent,
            Arc::clone(&self.progress),
        );

        // The rest of the handle keeps the watcher alive until the run ends.
        let report = pipeline.run(&root, handle.receiver, shutdown).await;
        Ok(report)
    }

    /// Convert an inline descriptor file into an extracted pair. The body goes
    /// to `target_dir` (default: next to the descriptor) and the descriptor
    /// file is rewritten there.
    pub fn extract_file(
        &self,
        descriptor_path: &Path,
        target_dir: Option<&Path>,
    ) -> Result<ExtractedPair, ScriptError> {
        let descriptor_path = self.absolute(descriptor_path);
        let descriptor = load_collection(&descriptor_path)?.into_single()?;
        let target = match target_dir {
            Some(dir) => dir.to_path_buf(),
            None => descriptor_path
                .parent()
                .map(|p| p.strip_prefix(&self.base_dir).unwrap_or(p).to_path_buf())
                .unwrap_or_default(),
        };
        let pair = self.extractor().extract(&descriptor, &target)?;
        pair.write_descriptor()?;
        if pair.descriptor_path != descriptor_path {
            info!(
                from = %descriptor_path.display(),
                to = %pair.descriptor_path.display(),
                "Descriptor written beside extracted body"
            );
        }
        Ok(pair)
    }

    /// Export one remote script into `target_dir`.
    pub async fn export_one(
        &self,
        id: &str,
        target_dir: &Path,
        extract: bool,
    ) -> Result<PathBuf, ScriptError> {
        let descriptor = self
            .publisher
            .service()
            .read(id)
            .await?
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        let mut written = self.extractor().export_collection(
            &DescriptorCollection::from_single(descriptor),
            target_dir,
            extract,
        )?;
        written
            .pop()
            .ok_or(ScriptError::MissingSingleScript { count: 0 })
    }

    /// Export every remote script into `target_dir`, one descriptor file each.
    pub async fn export_all(
        &self,
        target_dir: &Path,
        extract: bool,
    ) -> Result<Vec<PathBuf>, ScriptError> {
        let collection: DescriptorCollection =
            self.publisher.service().list().await?.into_iter().collect();
        self.extractor()
            .export_collection(&collection, target_dir, extract)
    }

    /// Export every remote script as one inline collection file.
    pub async fn export_bundle(&self, file: &Path) -> Result<usize, ScriptError> {
        let collection: DescriptorCollection =
            self.publisher.service().list().await?.into_iter().collect();
        let file = self.absolute(file);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ScriptError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        write_collection(&file, &collection)?;
        Ok(collection.len())
    }

    pub async fn list(&self) -> Result<Vec<ScriptDescriptor>, ScriptError> {
        Ok(self.publisher.service().list().await?)
    }
}
