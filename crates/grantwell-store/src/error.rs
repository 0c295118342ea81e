//! Store error types for the entity store abstraction layer.
//!
//! This module defines all error types that can occur during store operations.

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested record was not found.
    #[error("Record not found: {collection}/{id}")]
    NotFound {
        /// The collection that was searched.
        collection: String,
        /// The ID of the record that was not found.
        id: String,
    },

    /// A record with the same value in a unique field already exists.
    #[error("Unique constraint violated: {collection}.{field}")]
    UniqueViolation {
        /// The collection holding the conflicting record.
        collection: String,
        /// The field whose value collided.
        field: String,
    },

    /// An internal store error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Creates a new `UniqueViolation` error.
    #[must_use]
    pub fn unique_violation(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UniqueViolation {
            collection: collection.into(),
            field: field.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a unique constraint violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}
