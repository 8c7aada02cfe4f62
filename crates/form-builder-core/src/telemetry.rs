//! Logging setup
//!
//! Installs a `tracing-subscriber` fmt subscriber filtered by the configured
//! directive. Hosts that bring their own subscriber can skip this.

use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;
use crate::error::ConfigError;

/// Build the filter, letting `RUST_LOG` override the configured directive
pub fn env_filter(config: &EngineConfig) -> Result<EnvFilter, ConfigError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_filter)
            .map_err(|e| ConfigError::Logging(format!("invalid filter '{}': {}", config.log_filter, e))),
    }
}

/// Install the global subscriber
///
/// Calling this twice returns an error instead of panicking.
pub fn init_tracing(config: &EngineConfig) -> Result<(), ConfigError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let result = if config.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| ConfigError::Logging(e.to_string()))
}
