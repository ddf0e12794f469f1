//! Error types for the HCMS API.

use hcms_auth::AuthError;
use hcms_core::{ComplaintStatus, CoreError};
use hcms_store::StoreError;
use thiserror::Error;

/// Errors returned by the HCMS API.
///
/// Every variant reaches the caller as-is; nothing is retried internally.
#[derive(Debug, Error)]
pub enum HcmsError {
    /// Token is malformed or its signature does not verify.
    #[error("invalid session token")]
    InvalidToken,

    /// Token verified but has expired.
    #[error("session token expired")]
    TokenExpired,

    /// The caller's role does not permit the action, or the target is not
    /// theirs. Also returned for targets that do not exist when the caller
    /// could not have seen them anyway.
    #[error("forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: ComplaintStatus,
        to: ComplaintStatus,
    },

    /// The record changed since the caller read it. Re-read and retry.
    #[error("concurrent modification: expected version {expected}, found {actual}")]
    ConcurrentModification { expected: u64, actual: u64 },

    #[error("username already taken")]
    DuplicateUsername,

    #[error("invalid username or password")]
    InvalidCredentials,

    /// Hashing or encoding failure.
    #[error("internal error: {0}")]
    Internal(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// User-visible message category for an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// "Please log in again."
    AuthFailure,
    PermissionDenied,
    NotFound,
    BadInput,
    /// "Someone else changed this; reload and try again."
    Conflict,
    Internal,
}

impl HcmsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            HcmsError::InvalidToken | HcmsError::TokenExpired | HcmsError::InvalidCredentials => {
                ErrorCategory::AuthFailure
            }
            HcmsError::Forbidden => ErrorCategory::PermissionDenied,
            HcmsError::NotFound(_) => ErrorCategory::NotFound,
            HcmsError::InvalidInput(_) | HcmsError::InvalidTransition { .. } => {
                ErrorCategory::BadInput
            }
            HcmsError::ConcurrentModification { .. } | HcmsError::DuplicateUsername => {
                ErrorCategory::Conflict
            }
            HcmsError::Internal(_) | HcmsError::Store(_) => ErrorCategory::Internal,
        }
    }

    /// Only a concurrent modification is worth retrying, after a re-read.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HcmsError::ConcurrentModification { .. })
    }
}

impl From<CoreError> for HcmsError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => HcmsError::InvalidInput(msg),
            CoreError::InvalidTransition { from, to } => HcmsError::InvalidTransition { from, to },
            CoreError::UnknownVariant { .. } => HcmsError::InvalidInput(err.to_string()),
            CoreError::InvalidSignature | CoreError::InvalidPublicKey => HcmsError::InvalidToken,
            CoreError::CountMismatch { .. } => HcmsError::Internal(err.to_string()),
        }
    }
}

impl From<AuthError> for HcmsError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => HcmsError::InvalidToken,
            AuthError::TokenExpired => HcmsError::TokenExpired,
            AuthError::Forbidden => HcmsError::Forbidden,
            AuthError::InvalidCredentials => HcmsError::InvalidCredentials,
            AuthError::DuplicateUsername => HcmsError::DuplicateUsername,
            AuthError::InvalidInput(msg) => HcmsError::InvalidInput(msg),
            AuthError::Internal(msg) => HcmsError::Internal(msg),
            AuthError::Store(e) => HcmsError::Store(e),
        }
    }
}

/// Result type for HCMS operations.
pub type Result<T> = std::result::Result<T, HcmsError>;
