//! Tracing setup driven by [`LoggingConfig`].
//!
//! The services only emit events; nothing here runs unless the host asks.
//! Call [`init`] once at startup to install a stdout formatter, or
//! [`subscriber`] to build one around another writer. Token, refresh token
//! and code values are never recorded as fields.

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::config::{ConfigError, LoggingConfig};

/// Changes the level of a subscriber built by this module at runtime.
#[derive(Clone)]
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
}

impl LogHandle {
    /// Replaces the active filter.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `level` is not a filter
    /// directive, or `ConfigError::Logging` if the subscriber is gone.
    pub fn set_level(&self, level: &str) -> Result<(), ConfigError> {
        let filter = parse_level(level)?;
        self.filter
            .modify(|current| *current = filter)
            .map_err(|e| ConfigError::Logging(e.to_string()))?;
        tracing::info!(level, "Logging level changed");
        Ok(())
    }
}

/// Parses a level or `EnvFilter` directive list such as `"info"` or
/// `"grantwell_auth=debug,warn"`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for blank or malformed directives.
pub fn parse_level(level: &str) -> Result<EnvFilter, ConfigError> {
    if level.trim().is_empty() {
        return Err(ConfigError::InvalidValue(
            "logging.level must not be empty".to_string(),
        ));
    }
    EnvFilter::try_new(level)
        .map_err(|e| ConfigError::InvalidValue(format!("Invalid logging.level '{level}': {e}")))
}

/// The filter to start with: `RUST_LOG` when it is set and parses,
/// otherwise the configured level.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if the configured level is malformed.
pub fn build_filter(logging: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    parse_level(&logging.level)
}

/// Builds a reloadable subscriber writing plain-text events to `writer`,
/// without installing it.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if the configured level is malformed.
pub fn subscriber<W>(
    logging: &LoggingConfig,
    writer: W,
) -> Result<(impl Subscriber + Send + Sync + 'static, LogHandle), ConfigError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    Ok(layered(build_filter(logging)?, writer, false))
}

/// Installs the global subscriber, formatting to stdout.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if the configured level is malformed,
/// or `ConfigError::Logging` if a global subscriber is already installed.
pub fn init(logging: &LoggingConfig) -> Result<LogHandle, ConfigError> {
    let (subscriber, handle) = layered(build_filter(logging)?, std::io::stdout, true);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ConfigError::Logging(e.to_string()))?;
    Ok(handle)
}

fn layered<W>(
    filter: EnvFilter,
    writer: W,
    ansi: bool,
) -> (impl Subscriber + Send + Sync + 'static, LogHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(ansi));
    (subscriber, LogHandle { filter: handle })
}
