//! Common error types for OnceLink.

use thiserror::Error;

use crate::types::InvalidParam;

/// Top-level error type for OnceLink operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller input was malformed or out of range.
    ///
    /// Carries every offending field so they can be reported together.
    #[error("Validation failed: {} invalid parameter(s)", .0.len())]
    Validation(Vec<InvalidParam>),

    /// The secret is unknown, expired, or was already consumed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Wrong key, malformed key or tampered ciphertext.
    ///
    /// Deliberately carries no detail.
    #[error("Decryption failed")]
    Decryption,

    /// Cryptographic operation failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Storage operation failed for a reason other than reachability.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided (configuration, not request data).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

impl Error {
    /// Shorthand for a single-field validation failure.
    pub fn invalid_param(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation(vec![InvalidParam::new(name).with_reason(reason)])
    }

    /// Whether the caller should see this as "the secret does not exist".
    ///
    /// Decryption failures are folded into not-found so that a wrong key
    /// cannot be told apart from a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Decryption)
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decryption_counts_as_not_found() {
        assert!(Error::Decryption.is_not_found());
        assert!(Error::NotFound("gone".to_string()).is_not_found());
        assert!(!Error::StoreUnavailable("down".to_string()).is_not_found());
    }

    #[test]
    fn test_validation_display_counts_params() {
        let err = Error::Validation(vec![InvalidParam::new("password"), InvalidParam::new("ttl")]);
        assert_eq!(err.to_string(), "Validation failed: 2 invalid parameter(s)");
    }

    #[test]
    fn test_decryption_display_has_no_detail() {
        assert_eq!(Error::Decryption.to_string(), "Decryption failed");
    }
}
