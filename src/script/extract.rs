//! Extractor: move an inline body into a sibling file and point the descriptor at it.

use super::detect::source_text;
use super::model::{DescriptorCollection, ScriptBody, ScriptDescriptor, FILE_REFERENCE_PREFIX};
use crate::error::ScriptError;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Result of extracting one descriptor.
#[derive(Debug, Clone)]
pub struct ExtractedPair {
    /// Descriptor with its body rewritten to the reference form.
    pub descriptor: ScriptDescriptor,
    /// Where the body file was written.
    pub body_path: PathBuf,
    /// Sibling descriptor file path. Not written by [`Extractor::extract`].
    pub descriptor_path: PathBuf,
}

impl ExtractedPair {
    /// Write the rewritten descriptor as a single-entry collection.
    pub fn write_descriptor(&self) -> Result<(), ScriptError> {
        write_collection(
            &self.descriptor_path,
            &DescriptorCollection::from_single(self.descriptor.clone()),
        )
    }
}

/// Writes body files relative to an explicit base directory.
#[derive(Debug, Clone)]
pub struct Extractor {
    base_dir: PathBuf,
}

impl Extractor {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Write the body of `descriptor` to `<target_dir>/<name>.script.<ext>`.
    ///
    /// Relative `target_dir` values are taken from the base directory and kept
    /// relative in the written reference. The returned descriptor is only built
    /// once the body file is fully on disk.
    pub fn extract(
        &self,
        descriptor: &ScriptDescriptor,
        target_dir: &Path,
    ) -> Result<ExtractedPair, ScriptError> {
        let source = source_text(descriptor)?;

        let disk_dir = self.base_dir.join(target_dir);
        std::fs::create_dir_all(&disk_dir).map_err(|e| ScriptError::io(&disk_dir, e))?;

        let file_name = descriptor.body_file_name();
        let body_path = disk_dir.join(&file_name);
        write_atomic(&body_path, source.as_bytes())?;

        let mut rewritten = descriptor.clone();
        rewritten.body = ScriptBody::Text(format!(
            "{}{}",
            FILE_REFERENCE_PREFIX,
            reference_string(&target_dir.join(&file_name))
        ));
        debug!(script = %descriptor.name, body = %body_path.display(), "Extracted script body");

        Ok(ExtractedPair {
            descriptor: rewritten,
            descriptor_path: disk_dir.join(descriptor.descriptor_file_name()),
            body_path,
        })
    }

    /// Write one descriptor file per script into `target_dir`, extracting bodies
    /// when `extract` is set. Returns the descriptor paths in collection order.
    ///
    /// Names are not unique remotely. If two scripts map to the same file name,
    /// nothing is written and [`ScriptError::DuplicateFileName`] names both ids.
    pub fn export_collection(
        &self,
        collection: &DescriptorCollection,
        target_dir: &Path,
        extract: bool,
    ) -> Result<Vec<PathBuf>, ScriptError> {
        let disk_dir = self.base_dir.join(target_dir);

        // Body files share the descriptor's stem, so one claim covers the pair.
        let mut claimed: HashMap<PathBuf, &str> = HashMap::with_capacity(collection.len());
        for descriptor in collection.values() {
            let path = disk_dir.join(descriptor.descriptor_file_name());
            if let Some(first) = claimed.get(&path) {
                return Err(ScriptError::DuplicateFileName {
                    path,
                    first: first.to_string(),
                    second: descriptor.id.clone(),
                });
            }
            claimed.insert(path, &descriptor.id);
        }

        std::fs::create_dir_all(&disk_dir).map_err(|e| ScriptError::io(&disk_dir, e))?;

        let mut written = Vec::with_capacity(collection.len());
        for descriptor in collection.values() {
            let descriptor_path = if extract {
                let pair = self.extract(descriptor, target_dir)?;
                pair.write_descriptor()?;
                pair.descriptor_path
            } else {
                let path = disk_dir.join(descriptor.descriptor_file_name());
                write_collection(&path, &DescriptorCollection::from_single(descriptor.clone()))?;
                path
            };
            written.push(descriptor_path);
        }
        Ok(written)
    }
}

/// Serialize a collection as pretty JSON with a trailing newline.
pub fn write_collection(path: &Path, collection: &DescriptorCollection) -> Result<(), ScriptError> {
    let mut json = serde_json::to_string_pretty(collection).map_err(|e| ScriptError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ScriptError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let staging = path.with_file_name(format!(".{}.partial", file_name));
    std::fs::write(&staging, contents).map_err(|e| ScriptError::io(&staging, e))?;
    std::fs::rename(&staging, path).map_err(|e| {
        let _ = std::fs::remove_file(&staging);
        ScriptError::io(path, e)
    })
}

/// Render a path for a `file://` reference: `/` separators, no `.` segments.
fn reference_string(path: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut absolute = false;
    let mut prefixed = false;
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => {
                prefixed = true;
                parts.push(prefix.as_os_str().to_string_lossy().to_string())
            }
            Component::RootDir => absolute = true,
            Component::CurDir => {}
            Component::ParentDir => parts.push("..".to_string()),
            Component::Normal(name) => parts.push(name.to_string_lossy().to_string()),
        }
    }
    let joined = parts.join("/");
    if absolute && !prefixed {
        format!("/{}", joined)
    } else {
        joined
    }
}
