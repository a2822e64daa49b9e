//! Network endpoint errors
//!
//! Every failure the endpoint layer reports belongs to one of four kinds.
//! `NetworkError` carries a human-readable reason alongside the kind, and
//! `ResultCode` flattens a result into the status vocabulary consumed by the
//! protocol layer above.

use serde::{Deserialize, Serialize};

/// Result alias used throughout the crate
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors reported by endpoint operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// A required argument was absent or malformed
    #[error("Invalid parameter: {reason}")]
    InvalidParameter {
        /// What was wrong with the argument
        reason: String,
    },

    /// The underlying transport could not be created
    #[error("Network init failed: {reason}")]
    NetworkInitFailed {
        /// Why creation failed
        reason: String,
    },

    /// A read on an established socket or session failed
    #[error("Read failed: {reason}")]
    ReadFailed {
        /// Why the read failed
        reason: String,
    },

    /// A write on an established socket or session failed
    #[error("Write failed: {reason}")]
    WriteFailed {
        /// Why the write failed
        reason: String,
    },
}

impl NetworkError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    /// Create a network init failed error
    pub fn init_failed(reason: impl Into<String>) -> Self {
        Self::NetworkInitFailed {
            reason: reason.into(),
        }
    }

    /// Create a read failed error
    pub fn read_failed(reason: impl Into<String>) -> Self {
        Self::ReadFailed {
            reason: reason.into(),
        }
    }

    /// Create a write failed error
    pub fn write_failed(reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            reason: reason.into(),
        }
    }

    /// The flat result code for this error
    pub fn code(&self) -> ResultCode {
        match self {
            Self::InvalidParameter { .. } => ResultCode::InvalidParameter,
            Self::NetworkInitFailed { .. } => ResultCode::NetworkInitFailed,
            Self::ReadFailed { .. } => ResultCode::ReadFailed,
            Self::WriteFailed { .. } => ResultCode::WriteFailed,
        }
    }
}

/// Unified status vocabulary shared with the protocol layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    /// The operation completed
    Success,
    /// A required argument was absent or malformed
    InvalidParameter,
    /// A read failed after the transport existed
    ReadFailed,
    /// A write failed after the transport existed
    WriteFailed,
    /// Transport creation failed
    NetworkInitFailed,
}

impl ResultCode {
    /// Collapse any endpoint result into its code
    pub fn from_result<T>(result: &NetworkResult<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(err) => err.code(),
        }
    }

    /// Whether this code reports success
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::InvalidParameter => "invalid parameter",
            Self::ReadFailed => "read failed",
            Self::WriteFailed => "write failed",
            Self::NetworkInitFailed => "network init failed",
        };
        f.write_str(name)
    }
}
