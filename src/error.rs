//! Error types for fairness verification.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the engine, the registry and the reveal service.
///
/// Every variant is a structured rejection for the requester; none of them
/// is fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FairError {
    /// Malformed or out-of-range input.
    #[error("invalid {field}: {reason}")]
    InvalidParameter {
        /// Offending field name, as seen on the wire.
        field: &'static str,
        /// Human readable reason.
        reason: String,
    },

    /// No pending bet for the given identity.
    #[error("no pending bet for {username} at nonce {nonce}")]
    NotFound {
        /// Player name.
        username: String,
        /// Round nonce.
        nonce: u64,
    },

    /// Revealed seed does not reproduce the published commitment.
    #[error("server seed hash mismatch: committed {expected}, revealed seed hashes to {computed}")]
    HashMismatch {
        /// Commitment stored with the pending bet.
        expected: String,
        /// Hash of the revealed seed.
        computed: String,
    },
}

impl FairError {
    /// Build an `InvalidParameter` error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::HashMismatch { .. } => ErrorCode::HashMismatch,
        }
    }
}

/// Wire codes for rejected requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Request failed validation.
    InvalidParameter,
    /// No matching commitment.
    NotFound,
    /// Commitment does not match the revealed seed.
    HashMismatch,
}

/// Result alias for fairness operations.
pub type FairResult<T> = Result<T, FairError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(FairError::invalid("mines", "too many").code(), ErrorCode::InvalidParameter);
        assert_eq!(
            FairError::NotFound { username: "bob".into(), nonce: 7 }.code(),
            ErrorCode::NotFound
        );
    }

    #[test]
    fn test_error_display() {
        let err = FairError::NotFound { username: "bob".into(), nonce: 7 };
        assert_eq!(err.to_string(), "no pending bet for bob at nonce 7");

        let err = FairError::invalid("mines", "must be between 1 and 24, got 25");
        assert_eq!(err.to_string(), "invalid mines: must be between 1 and 24, got 25");
    }

    #[test]
    fn test_code_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorCode::HashMismatch).unwrap();
        assert_eq!(json, "\"hash_mismatch\"");
    }
}
