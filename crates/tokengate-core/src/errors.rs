//! Unified error type for tokengate
//!
//! A single flat error enum shared by every crate in the workspace. Library
//! operations that can fail return [`GateResult`]; the use orchestration in
//! `tokengate-guards` converts these into user-facing feedback instead of
//! propagating them.

use serde::{Deserialize, Serialize};

/// Unified error type for all tokengate operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum GateError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Object or attribute not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Permission denied by a field lock or access policy
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Error message describing the permission issue
        message: String,
    },

    /// Cryptographic operation failed
    #[error("Crypto error: {message}")]
    Crypto {
        /// Error message describing the cryptographic failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl GateError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Prefix the message with where the error happened
    pub fn with_context(self, context: &str) -> Self {
        match self {
            GateError::Invalid { message } => GateError::invalid(format!("{context}: {message}")),
            GateError::NotFound { message } => {
                GateError::not_found(format!("{context}: {message}"))
            }
            GateError::PermissionDenied { message } => {
                GateError::permission_denied(format!("{context}: {message}"))
            }
            GateError::Crypto { message } => GateError::crypto(format!("{context}: {message}")),
            GateError::Serialization { message } => {
                GateError::serialization(format!("{context}: {message}"))
            }
            GateError::Internal { message } => GateError::internal(format!("{context}: {message}")),
        }
    }

    /// Returns `true` for errors raised by a lock or policy check.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

/// Standard Result type for tokengate operations
pub type GateResult<T> = std::result::Result<T, GateError>;

impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl From<toml::de::Error> for GateError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<serde_json::Error> for GateError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
