//! Environment variable source: SCRIPTSYNC_* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// `SCRIPTSYNC__REMOTE__BASE_URL` sets `remote.base_url`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("SCRIPTSYNC")
            .separator("__")
            .try_parsing(true),
    ))
}
