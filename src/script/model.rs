//! Script descriptor data model and the on-disk naming convention.

use crate::error::ScriptError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Artifact type tag shared by descriptor and body file names.
pub const SCRIPT_TYPE_SUFFIX: &str = "script";

/// Extension of descriptor files, after the type tag.
pub const DESCRIPTOR_EXTENSION: &str = "json";

/// Prefix marking a body that lives in a sibling file.
pub const FILE_REFERENCE_PREFIX: &str = "file://";

/// Scripting language of a descriptor. Closed set; drives the body file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScriptLanguage {
    Javascript,
    Groovy,
}

impl ScriptLanguage {
    pub const ALL: [ScriptLanguage; 2] = [ScriptLanguage::Javascript, ScriptLanguage::Groovy];

    /// Body file extension for this language.
    pub fn extension(self) -> &'static str {
        match self {
            ScriptLanguage::Javascript => "js",
            ScriptLanguage::Groovy => "groovy",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.extension() == ext)
    }
}

impl fmt::Display for ScriptLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptLanguage::Javascript => write!(f, "JAVASCRIPT"),
            ScriptLanguage::Groovy => write!(f, "GROOVY"),
        }
    }
}

/// Raw `script` field value. A string is either base64 source or a file reference;
/// see [`crate::script::detect`] for the classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptBody {
    Lines(Vec<String>),
    Text(String),
}

/// One scripted artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDescriptor {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub context: String,
    pub language: ScriptLanguage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "script")]
    pub body: ScriptBody,
    /// Fields owned by the remote service that this tool passes through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ScriptDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        context: impl Into<String>,
        language: ScriptLanguage,
        body: ScriptBody,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            context: context.into(),
            language,
            description: None,
            body,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Descriptor file name for this script (`<sanitized>.script.json`).
    pub fn descriptor_file_name(&self) -> String {
        descriptor_file_name(&self.name)
    }

    /// Body file name for this script (`<sanitized>.script.<ext>`).
    pub fn body_file_name(&self) -> String {
        body_file_name(&self.name, self.language)
    }
}

/// Mapping from script id to descriptor; the unit of transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptorCollection {
    entries: BTreeMap<String, ScriptDescriptor>,
}

impl DescriptorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_single(descriptor: ScriptDescriptor) -> Self {
        let mut collection = Self::new();
        collection.insert(descriptor);
        collection
    }

    /// Insert keyed by the descriptor's id, replacing any previous entry.
    pub fn insert(&mut self, descriptor: ScriptDescriptor) -> Option<ScriptDescriptor> {
        self.entries.insert(descriptor.id.clone(), descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ScriptDescriptor> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ScriptDescriptor)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &ScriptDescriptor> {
        self.entries.values()
    }

    /// Single-script view. Never picks an entry out of a larger collection.
    pub fn single(&self) -> Result<&ScriptDescriptor, ScriptError> {
        let count = self.entries.len();
        if count != 1 {
            return Err(ScriptError::MissingSingleScript { count });
        }
        self.entries
            .values()
            .next()
            .ok_or(ScriptError::MissingSingleScript { count })
    }

    pub fn into_single(self) -> Result<ScriptDescriptor, ScriptError> {
        let count = self.entries.len();
        if count != 1 {
            return Err(ScriptError::MissingSingleScript { count });
        }
        self.entries
            .into_values()
            .next()
            .ok_or(ScriptError::MissingSingleScript { count })
    }
}

impl FromIterator<ScriptDescriptor> for DescriptorCollection {
    fn from_iter<I: IntoIterator<Item = ScriptDescriptor>>(iter: I) -> Self {
        let mut collection = Self::new();
        for descriptor in iter {
            collection.insert(descriptor);
        }
        collection
    }
}

/// Reduce a script name to a file-name token: anything outside `[A-Za-z0-9_.-]` becomes `-`.
pub fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "unnamed".to_string()
    } else {
        sanitized
    }
}

pub fn descriptor_file_name(name: &str) -> String {
    format!(
        "{}.{}.{}",
        sanitize_name(name),
        SCRIPT_TYPE_SUFFIX,
        DESCRIPTOR_EXTENSION
    )
}

pub fn body_file_name(name: &str, language: ScriptLanguage) -> String {
    format!(
        "{}.{}.{}",
        sanitize_name(name),
        SCRIPT_TYPE_SUFFIX,
        language.extension()
    )
}
