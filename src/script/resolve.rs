//! Descriptor/body resolution for extracted pairs.
//!
//! Maps a descriptor file to its body file and back, and re-inlines an
//! extracted pair into a single descriptor ready for publishing.

use super::detect::{detect, Representation};
use super::model::{
    DescriptorCollection, ScriptBody, ScriptDescriptor, ScriptLanguage, DESCRIPTOR_EXTENSION,
    SCRIPT_TYPE_SUFFIX,
};
use crate::error::ScriptError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which half of an extracted pair a path names, judged by file name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairFileKind {
    Descriptor,
    Body(ScriptLanguage),
}

/// Classify a path by its `.script.json` / `.script.<ext>` suffix.
pub fn pair_file_kind(path: &Path) -> Option<PairFileKind> {
    let name = path.file_name()?.to_str()?;
    if stem_before(name, DESCRIPTOR_EXTENSION).is_some() {
        return Some(PairFileKind::Descriptor);
    }
    ScriptLanguage::ALL
        .into_iter()
        .find(|lang| stem_before(name, lang.extension()).is_some())
        .map(PairFileKind::Body)
}

/// Sibling descriptor path of a body file (`<x>.script.<ext>` to `<x>.script.json`).
/// Pure naming transform; the file need not exist.
pub fn descriptor_path_for(body_path: &Path) -> Option<PathBuf> {
    let name = body_path.file_name()?.to_str()?;
    let stem = ScriptLanguage::ALL
        .into_iter()
        .find_map(|lang| stem_before(name, lang.extension()))?;
    Some(body_path.with_file_name(format!(
        "{}.{}.{}",
        stem, SCRIPT_TYPE_SUFFIX, DESCRIPTOR_EXTENSION
    )))
}

/// `<stem>.script.<extension>` -> `<stem>`, requiring a non-empty stem.
fn stem_before<'a>(file_name: &'a str, extension: &str) -> Option<&'a str> {
    let suffix = format!(".{}.{}", SCRIPT_TYPE_SUFFIX, extension);
    file_name
        .strip_suffix(suffix.as_str())
        .filter(|stem| !stem.is_empty())
}

/// Resolves references relative to an explicit base directory.
#[derive(Debug, Clone)]
pub struct Resolver {
    base_dir: PathBuf,
}

impl Resolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Descriptor path owning `path`: itself for descriptor files, the sibling
    /// descriptor for body files, `None` for anything else.
    pub fn owning_descriptor(&self, path: &Path) -> Option<PathBuf> {
        match pair_file_kind(path)? {
            PairFileKind::Descriptor => Some(path.to_path_buf()),
            PairFileKind::Body(_) => descriptor_path_for(path),
        }
    }

    /// Body file referenced by a descriptor file, or `None` when the body is inline.
    pub fn body_path_for(&self, descriptor_path: &Path) -> Result<Option<PathBuf>, ScriptError> {
        if pair_file_kind(descriptor_path) != Some(PairFileKind::Descriptor) {
            return Ok(None);
        }
        let collection = load_collection(descriptor_path)?;
        let descriptor = collection.single()?;
        Ok(match detect(descriptor) {
            Representation::Reference(reference) => {
                Some(self.resolve_reference(descriptor_path, &reference))
            }
            Representation::LineArray | Representation::EncodedScalar => None,
        })
    }

    /// Load a descriptor file and inline its body if it is extracted.
    ///
    /// The file must hold exactly one script. An extracted body is read back and
    /// split on newlines into the line-array form.
    pub fn materialize(&self, descriptor_path: &Path) -> Result<ScriptDescriptor, ScriptError> {
        let mut descriptor = load_collection(descriptor_path)?.into_single()?;

        if let Representation::Reference(reference) = detect(&descriptor) {
            let body_path = self.resolve_reference(descriptor_path, &reference);
            let source = std::fs::read_to_string(&body_path).map_err(|e| {
                ScriptError::MissingBodyFile {
                    path: body_path.clone(),
                    source: e,
                }
            })?;
            descriptor.body = ScriptBody::Lines(split_lines(&source));
            debug!(
                script = %descriptor.name,
                body = %body_path.display(),
                "Materialized extracted script"
            );
        }

        Ok(descriptor)
    }

    /// Relative references are taken from the base directory; a reference that
    /// only exists next to the descriptor (hand-authored pairs) resolves there.
    fn resolve_reference(&self, descriptor_path: &Path, reference: &Path) -> PathBuf {
        if reference.is_absolute() {
            return reference.to_path_buf();
        }
        let from_base = self.base_dir.join(reference);
        if from_base.exists() {
            return from_base;
        }
        if let Some(dir) = descriptor_path.parent() {
            let beside = dir.join(reference);
            if beside.exists() {
                return beside;
            }
        }
        from_base
    }
}

/// Read and parse a descriptor file.
pub fn load_collection(path: &Path) -> Result<DescriptorCollection, ScriptError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ScriptError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| ScriptError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

fn split_lines(source: &str) -> Vec<String> {
    source
        .replace("\r\n", "\n")
        .split('\n')
        .map(str::to_string)
        .collect()
}
