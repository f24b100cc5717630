//! Script descriptors and the inline/extracted transform.

pub mod detect;
pub mod extract;
pub mod model;
pub mod resolve;
pub mod validate;

pub use detect::{detect, detect_single, is_extracted, source_text, Representation};
pub use extract::{write_collection, ExtractedPair, Extractor};
pub use model::{
    body_file_name, descriptor_file_name, sanitize_name, DescriptorCollection, ScriptBody,
    ScriptDescriptor, ScriptLanguage,
};
pub use resolve::{descriptor_path_for, load_collection, pair_file_kind, PairFileKind, Resolver};
pub use validate::validate_descriptor;
