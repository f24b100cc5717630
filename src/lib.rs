//! Scriptsync: Script Descriptors as Editable Files
//!
//! Moves the source of scripted configuration descriptors between the inline
//! JSON form a script service stores and a descriptor/body file pair a person
//! can edit, then publishes edited pairs back, once or continuously while
//! watching a directory.

pub mod config;
pub mod error;
pub mod logging;
pub mod progress;
pub mod remote;
pub mod script;
pub mod sync;
pub mod tooling;
