//! Unified error system for Signet
//!
//! One error type crosses every crate boundary in the workspace. Variants map
//! to the failure classes the engine can actually surface; a commit that loses
//! the optimistic token comparison is a `bool`, never an error.

use serde::{Deserialize, Serialize};

/// Unified error type for all Signet operations
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum SignetError {
    /// The referenced entity, row, or resource does not exist
    #[error("Not found: {message}")]
    NotFound {
        /// What was not found
        message: String,
    },

    /// An upstream key-material fetch failed (transport, rate limit, pending refresh)
    #[error("Fetch failed: {message}")]
    FetchFailed {
        /// Why the fetch failed
        message: String,
    },

    /// The upstream key-query service rejected the call for rate limiting
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Upstream rate-limit detail
        message: String,
    },

    /// The user holds no role on a non-terminal transaction
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// What was denied
        message: String,
    },

    /// Backing-store operation failed
    #[error("Storage error: {message}")]
    Storage {
        /// What the store reported
        message: String,
    },

    /// Encoding or decoding of a key blob or config failed
    #[error("Serialization error: {message}")]
    Serialization {
        /// What failed to (de)serialize
        message: String,
    },

    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// What was invalid
        message: String,
    },

    /// Internal invariant violation
    #[error("Internal error: {message}")]
    Internal {
        /// What went wrong
        message: String,
    },
}

impl SignetError {
    /// Create a not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a fetch-failed error
    pub fn fetch_failed(message: impl Into<String>) -> Self {
        Self::FetchFailed {
            message: message.into(),
        }
    }

    /// Create a rate-limited error
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an invalid-input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for errors that describe a missing upstream entity,
    /// as opposed to a transient fetch problem.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias used across the workspace
pub type SignetResult<T> = Result<T, SignetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message() {
        let err = SignetError::not_found("account 0.0.42");
        assert_eq!(err.to_string(), "Not found: account 0.0.42");
        assert!(err.is_not_found());
    }

    #[test]
    fn errors_round_trip_through_serde() {
        let err = SignetError::fetch_failed("upstream timeout");
        let json = serde_json::to_string(&err).expect("serialize");
        let back: SignetError = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.to_string(), err.to_string());
    }
}
