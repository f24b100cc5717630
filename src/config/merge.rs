pub mod service;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the values every section falls back to.
pub(crate) fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("remote.timeout_secs", 30)?
        .set_default("watch.channel_capacity", 256)?
        .set_default("logging.level", "info")
}
