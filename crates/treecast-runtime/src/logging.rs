#![forbid(unsafe_code)]

//! Global `tracing` subscriber installation.
//!
//! Libraries in this workspace only emit events; binaries and tests decide
//! where they go. [`init_tracing`] installs a `tracing-subscriber` formatter
//! filtered by [`LoggingConfig::filter`], in plain or JSON form.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::ConfigError;

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// [`ConfigError::Logging`] if the filter directive is invalid or a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter =
        EnvFilter::try_new(&config.filter).map_err(|e| ConfigError::Logging(e.to_string()))?;
    let result = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
    };
    result.map_err(|e| ConfigError::Logging(e.to_string()))
}
