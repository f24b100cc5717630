//! Remote script service: the collaborator that persists descriptors.

mod contract;
mod http;
mod memory;

pub use contract::ScriptService;
pub use http::HttpScriptService;
pub use memory::{InMemoryScriptService, RemoteCall};
