//! Configuration
//!
//! Layered settings for the remote service, directory watching, and logging.
//! Precedence (lowest to highest): built-in defaults, global file
//! (`$XDG_CONFIG_HOME/scriptsync/config.toml`), workspace file
//! (`scriptsync.toml`), `SCRIPTSYNC__SECTION__KEY` environment variables.

mod facade;
mod merge;
pub mod paths;
mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use crate::sync::{default_ignore_patterns, WatchConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Workspace configuration file name.
pub const WORKSPACE_CONFIG_FILE: &str = "scriptsync.toml";

fn default_timeout_secs() -> u64 {
    30
}

fn default_channel_capacity() -> usize {
    256
}

/// Remote script service connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the script service; unset means no remote is configured
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Directory import and watch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchSettings {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

impl WatchSettings {
    /// Watch configuration rooted at `root`, one-shot until told otherwise.
    pub fn to_watch_config(&self, root: &Path) -> WatchConfig {
        WatchConfig {
            root: root.to_path_buf(),
            persistent: false,
            channel_capacity: self.channel_capacity,
            ignore_patterns: self.ignore_patterns.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptsyncConfig {
    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub watch: WatchSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}
