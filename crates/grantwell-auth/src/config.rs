//! Token and grant configuration.
//!
//! This module provides the configuration types for the token core: scope
//! lists, refresh token behaviour, token lifetimes and logging.
//!
//! Configuration is read-only once a service is built from it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [oauth]
/// default_scopes = ["public"]
/// optional_scopes = ["read", "write"]
/// use_refresh_token = true
/// access_token_lifetime = "2h"
/// authorization_code_lifetime = "10m"
///
/// [logging]
/// level = "info"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GrantwellConfig {
    /// Token and grant issuance settings.
    pub oauth: OAuthConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// OAuth 2.0 token issuance configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Scopes granted when a request names none.
    pub default_scopes: Vec<String>,

    /// Additional scopes applications without their own scope list may request.
    pub optional_scopes: Vec<String>,

    /// Issue a refresh token alongside each access token.
    pub use_refresh_token: bool,

    /// Keep a rotated refresh token alive until its successor is first used.
    /// When disabled, the previous token is revoked as soon as it is rotated.
    pub revoke_refresh_token_on_use: bool,

    /// Access token lifetime. `"never"` issues tokens that do not expire.
    #[serde(with = "optional_lifetime")]
    pub access_token_lifetime: Option<Duration>,

    /// Authorization code lifetime.
    #[serde(with = "humantime_serde")]
    pub authorization_code_lifetime: Duration,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            default_scopes: vec!["public".to_string()],
            optional_scopes: Vec::new(),
            use_refresh_token: false,
            revoke_refresh_token_on_use: false,
            access_token_lifetime: Some(Duration::from_secs(7200)), // 2 hours
            authorization_code_lifetime: Duration::from_secs(600),  // 10 minutes
        }
    }
}

impl OAuthConfig {
    /// Access token lifetime in whole seconds, or `None` for tokens that never
    /// expire.
    #[must_use]
    pub fn access_token_expires_in(&self) -> Option<i64> {
        self.access_token_lifetime.map(secs)
    }

    /// Authorization code lifetime in whole seconds.
    #[must_use]
    pub fn authorization_code_expires_in(&self) -> i64 {
        secs(self.authorization_code_lifetime)
    }
}

/// Whole seconds, saturating at `i64::MAX`. Lifetimes that end past the
/// largest representable date are treated as never expiring.
fn secs(lifetime: Duration) -> i64 {
    i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX)
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// The configuration sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(String),

    /// The tracing subscriber could not be installed or reloaded.
    #[error("Failed to set up logging: {0}")]
    Logging(String),
}

impl GrantwellConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// See [`OAuthConfig::validate`]. Also returns
    /// `ConfigError::InvalidValue` if `logging.level` is not a filter
    /// directive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.oauth.validate()?;
        crate::observability::parse_level(&self.logging.level)?;
        Ok(())
    }
}

impl OAuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no default scope is configured.
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - A scope name is empty or contains whitespace
    /// - The authorization code lifetime is zero
    /// - The access token lifetime is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_scopes.is_empty() {
            return Err(ConfigError::Missing("oauth.default_scopes".to_string()));
        }

        for scope in self.default_scopes.iter().chain(&self.optional_scopes) {
            if scope.is_empty() || scope.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid scope name: '{}'. Scope names must be non-empty and contain no whitespace",
                    scope
                )));
            }
        }

        if self.authorization_code_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "authorization_code_lifetime must be > 0".to_string(),
            ));
        }

        if self.access_token_lifetime.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::InvalidValue(
                "access_token_lifetime must be > 0 or \"never\"".to_string(),
            ));
        }

        Ok(())
    }
}

/// Serde adapter for lifetimes that may be `"never"`.
mod optional_lifetime {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    const NEVER: &str = "never";

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(lifetime) => humantime_serde::serialize(lifetime, s),
            None => s.serialize_str(NEVER),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let raw = String::deserialize(d)?;
        if raw.trim().eq_ignore_ascii_case(NEVER) {
            return Ok(None);
        }
        humantime::parse_duration(raw.trim())
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid lifetime '{raw}': {e}")))
    }
}

pub mod loader {
    //! Layered configuration loading: TOML file, then `GRANTWELL__*`
    //! environment overrides.

    use super::{ConfigError, GrantwellConfig};
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Default configuration file looked up when no path is given.
    pub const DEFAULT_PATH: &str = "grantwell.toml";

    /// Loads and validates the configuration.
    ///
    /// A missing file is not an error; defaults and environment overrides
    /// still apply. Environment variables use `__` as separator, e.g.
    /// `GRANTWELL__OAUTH__USE_REFRESH_TOKEN=true`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if a source cannot be parsed, or a
    /// validation error from [`GrantwellConfig::validate`].
    pub fn load_config(path: Option<&str>) -> Result<GrantwellConfig, ConfigError> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        builder = builder.add_source(
            Environment::with_prefix("GRANTWELL")
                .try_parsing(true)
                .separator("__"),
        );

        let cfg = builder
            .build()
            .map_err(|e| ConfigError::Load(format!("config build error: {e}")))?;
        let merged: GrantwellConfig = cfg
            .try_deserialize()
            .map_err(|e| ConfigError::Load(format!("config deserialize error: {e}")))?;

        merged.validate()?;
        tracing::debug!(
            default_scopes = ?merged.oauth.default_scopes,
            use_refresh_token = merged.oauth.use_refresh_token,
            "Configuration loaded"
        );
        Ok(merged)
    }
}
