//! Tooling & Integration Layer
//!
//! Command-line entry points over the import/export services.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
