//! Token and grant error types.
//!
//! This module defines all error types that can occur while issuing, looking
//! up, rotating and revoking tokens and grants.

use std::fmt;

use grantwell_store::StoreError;

use crate::config::ConfigError;

/// Errors that can occur during token and grant operations.
///
/// Lookup misses are not errors: accessors return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The requested scope is not a subset of the permitted scopes.
    #[error("Invalid scope: {requested:?} not in permitted scopes list: {permitted}")]
    InvalidScope {
        /// The scope string as requested.
        requested: String,
        /// Rendering of the permitted scopes, for diagnostics.
        permitted: String,
    },

    /// One or more fields failed validation.
    #[error("Validation failed: {errors}")]
    Validation {
        /// The aggregated field failures.
        errors: ValidationErrors,
    },

    /// The presented grant or refresh token cannot be used.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description of why the grant is invalid.
        message: String,
    },

    /// An error occurred while storing or retrieving records.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidScope` error.
    #[must_use]
    pub fn invalid_scope(requested: impl Into<String>, permitted: impl Into<String>) -> Self {
        Self::InvalidScope {
            requested: requested.into(),
            permitted: permitted.into(),
        }
    }

    /// Creates a new `Validation` error from aggregated field errors.
    #[must_use]
    pub fn validation(errors: ValidationErrors) -> Self {
        Self::Validation { errors }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if this is an invalid scope error.
    #[must_use]
    pub fn is_invalid_scope(&self) -> bool {
        matches!(self, Self::InvalidScope { .. })
    }

    /// Returns `true` if this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidScope { .. } | Self::Validation { .. } | Self::InvalidGrant { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidScope { .. } => ErrorCategory::Authorization,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::InvalidGrant { .. } => ErrorCategory::Token,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }

    /// Returns the OAuth 2.0 error code the protocol layer should report.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidScope { .. } => "invalid_scope",
            Self::Validation { .. } => "invalid_request",
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::Storage { .. } => "server_error",
            Self::Configuration { .. } => "server_error",
        }
    }
}

impl From<StoreError> for AuthError {
    /// Unique collisions become field-level validation failures; everything
    /// else is a storage failure.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { field, .. } => {
                Self::validation(ValidationErrors::single(field, "has already been taken"))
            }
            other => Self::storage(other.to_string()),
        }
    }
}

impl From<ConfigError> for AuthError {
    fn from(err: ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the offending field.
    pub field: String,
    /// Human-readable failure description.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Aggregated field-level validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Creates an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an error set holding one failure.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records a failure on `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Returns `true` if no failures were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the recorded failures.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Returns the failures recorded on `field`.
    pub fn on<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.field == field)
    }

    /// Turns the set into `Ok(())` when empty, or a `Validation` error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if any failure was recorded.
    pub fn into_result(self) -> Result<(), AuthError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AuthError::validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

/// Categories of errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Authorization-related errors (scope checks).
    Authorization,
    /// Token-related errors (unusable grants, refresh tokens).
    Token,
    /// Request validation errors.
    Validation,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authorization => write!(f, "authorization"),
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::invalid_scope("invalid", r#"["public","read","write"]"#);
        assert_eq!(
            err.to_string(),
            r#"Invalid scope: "invalid" not in permitted scopes list: ["public","read","write"]"#
        );

        let err = AuthError::invalid_grant("refresh token revoked");
        assert_eq!(err.to_string(), "Invalid grant: refresh token revoked");

        let mut errors = ValidationErrors::new();
        errors.add("token", "can't be blank");
        errors.add("redirect_uri", "can't be blank");
        let err = AuthError::validation(errors);
        assert_eq!(
            err.to_string(),
            "Validation failed: token can't be blank; redirect_uri can't be blank"
        );
    }

    #[test]
    fn test_error_predicates() {
        let err = AuthError::invalid_scope("x", "\"y\"");
        assert!(err.is_invalid_scope());
        assert!(err.is_client_error());
        assert!(!err.is_server_error());

        let err = AuthError::storage("connection reset");
        assert!(!err.is_client_error());
        assert!(err.is_server_error());
    }

    #[test]
    fn test_oauth_error_code() {
        assert_eq!(
            AuthError::invalid_scope("a", "b").oauth_error_code(),
            "invalid_scope"
        );
        assert_eq!(
            AuthError::validation(ValidationErrors::single("token", "can't be blank"))
                .oauth_error_code(),
            "invalid_request"
        );
        assert_eq!(
            AuthError::invalid_grant("used").oauth_error_code(),
            "invalid_grant"
        );
        assert_eq!(
            AuthError::storage("x").oauth_error_code(),
            "server_error"
        );
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::invalid_scope("a", "b").category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            AuthError::storage("x").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
    }

    #[test]
    fn test_unique_violation_becomes_field_error() {
        let err: AuthError = StoreError::unique_violation("access_tokens", "refresh_token").into();
        match err {
            AuthError::Validation { errors } => {
                let failures: Vec<_> = errors.on("refresh_token").collect();
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].message, "has already been taken");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_other_store_errors_become_storage() {
        let err: AuthError = StoreError::internal("disk full").into();
        assert!(matches!(err, AuthError::Storage { .. }));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_config_error_becomes_configuration() {
        let err: AuthError = ConfigError::Missing("oauth.default_scopes".to_string()).into();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.is_server_error());
        assert!(err.to_string().contains("oauth.default_scopes"));
    }

    #[test]
    fn test_empty_validation_errors_are_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
        assert!(
            ValidationErrors::single("token", "can't be blank")
                .into_result()
                .is_err()
        );
    }
}
