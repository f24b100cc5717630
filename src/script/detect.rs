//! Representation detection for a descriptor's `script` field.
//!
//! Detection is a single-entry predicate: callers holding a collection narrow it
//! to one entry first (see [`detect_single`]).

use super::model::{DescriptorCollection, ScriptBody, ScriptDescriptor, FILE_REFERENCE_PREFIX};
use crate::error::ScriptError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::PathBuf;

/// Which of the three body forms a descriptor is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
    /// Ordered source lines, inline.
    LineArray,
    /// Single base64 string, inline.
    EncodedScalar,
    /// `file://` reference to a sibling body file; path exactly as written.
    Reference(PathBuf),
}

impl Representation {
    pub fn is_extracted(&self) -> bool {
        matches!(self, Representation::Reference(_))
    }
}

/// Classify the body: sequence first, then file reference, else encoded scalar.
pub fn detect(descriptor: &ScriptDescriptor) -> Representation {
    match &descriptor.body {
        ScriptBody::Lines(_) => Representation::LineArray,
        ScriptBody::Text(text) => match reference_path(descriptor, text) {
            Some(path) => Representation::Reference(path),
            None => Representation::EncodedScalar,
        },
    }
}

/// Classify the only entry of a collection; fails on zero or several entries.
pub fn detect_single(collection: &DescriptorCollection) -> Result<Representation, ScriptError> {
    collection.single().map(detect)
}

pub fn is_extracted(descriptor: &ScriptDescriptor) -> bool {
    detect(descriptor).is_extracted()
}

fn reference_path(descriptor: &ScriptDescriptor, text: &str) -> Option<PathBuf> {
    let path = text.strip_prefix(FILE_REFERENCE_PREFIX)?;
    let suffix = format!(".{}", descriptor.language.extension());
    if path.len() > suffix.len() && path.ends_with(&suffix) {
        Some(PathBuf::from(path))
    } else {
        None
    }
}

/// Raw source text of an inline descriptor. Lines are joined with `\n`.
pub fn source_text(descriptor: &ScriptDescriptor) -> Result<String, ScriptError> {
    match &descriptor.body {
        ScriptBody::Lines(lines) => Ok(lines.join("\n")),
        ScriptBody::Text(text) => {
            if reference_path(descriptor, text).is_some() {
                return Err(ScriptError::NotInline {
                    name: descriptor.name.clone(),
                });
            }
            decode_scalar(&descriptor.name, text)
        }
    }
}

fn decode_scalar(name: &str, text: &str) -> Result<String, ScriptError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|e| ScriptError::Decode {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| ScriptError::Decode {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Encode source text into the scalar form used by the remote service.
pub fn encode_source(source: &str) -> String {
    STANDARD.encode(source.as_bytes())
}
