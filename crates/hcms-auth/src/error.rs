//! Error types for the auth module.

use hcms_core::CoreError;
use hcms_store::StoreError;
use thiserror::Error;

/// Errors that can occur during authentication and authorization.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token is malformed, has a bad signature, or was signed by another key.
    #[error("invalid session token")]
    InvalidToken,

    /// Token verified but its lifetime has ended.
    #[error("session token expired")]
    TokenExpired,

    /// The role matrix denies the action.
    #[error("forbidden")]
    Forbidden,

    /// Login failed. Does not say which part was wrong.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Username is already registered.
    #[error("username already taken")]
    DuplicateUsername,

    /// Rejected input (empty username, empty secret, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Hashing or token encoding failed.
    #[error("internal error: {0}")]
    Internal(String),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<CoreError> for AuthError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => AuthError::InvalidInput(msg),
            CoreError::InvalidSignature | CoreError::InvalidPublicKey => AuthError::InvalidToken,
            other => AuthError::InvalidInput(other.to_string()),
        }
    }
}

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;
