//! Authentication error types

use thiserror::Error;

use crate::store::StoreError;

/// Result type for auth operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur during authentication operations
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input, rejected before touching any store
    #[error("invalid {field}: {message}")]
    Validation {
        /// Field that failed validation
        field: &'static str,
        /// Error message
        message: String,
    },

    /// Login failed - deliberately identical for unknown email and wrong password
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Session token signature, structure, or kind tag mismatch
    #[error("invalid token")]
    InvalidToken,

    /// Session token has expired
    #[error("token expired")]
    TokenExpired,

    /// API key unknown, revoked, or expired - collapsed to one error
    #[error("invalid API key")]
    InvalidApiKey,

    /// Bearer credential rejected by every validator
    #[error("invalid authentication credentials")]
    InvalidAuth,

    /// Caller does not own the resource
    #[error("unauthorized")]
    Unauthorized,

    /// Resource already exists
    #[error("{entity} already exists")]
    Conflict {
        /// Kind of entity that collided
        entity: &'static str,
    },

    /// Resource absent
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity looked up
        entity: &'static str,
        /// Identifier that missed
        id: String,
    },

    /// Store, crypto, or infrastructure failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Create a Validation error
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a Conflict error
    pub fn conflict(entity: &'static str) -> Self {
        Self::Conflict { entity }
    }

    /// Create a NotFound error
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error is an infrastructure failure rather than a rejection
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { entity, .. } => Self::Conflict { entity },
            StoreError::Backend(message) => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = AuthError::validation("email", "must not be empty");
        assert!(err.to_string().contains("email"));
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_not_found() {
        let err = AuthError::not_found("api key", "abc-123");
        assert!(err.to_string().contains("api key"));
        assert!(err.to_string().contains("abc-123"));
    }

    #[test]
    fn test_store_backend_maps_to_internal() {
        let err: AuthError = StoreError::backend("connection reset").into();
        assert!(err.is_internal());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_store_duplicate_maps_to_conflict() {
        let err: AuthError = StoreError::duplicate("user", "a@b.com").into();
        assert!(matches!(err, AuthError::Conflict { entity: "user" }));
    }

    #[test]
    fn test_credential_errors_carry_no_detail() {
        // Login and API key failures must not leak which condition triggered.
        assert_eq!(AuthError::InvalidCredentials.to_string(), "invalid credentials");
        assert_eq!(AuthError::InvalidApiKey.to_string(), "invalid API key");
    }
}
