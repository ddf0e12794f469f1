//! Error types for the HCMS core.

use thiserror::Error;

use crate::complaint::ComplaintStatus;

/// Errors raised by pure domain rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: ComplaintStatus,
        to: ComplaintStatus,
    },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("status counts do not sum to total: {sum} != {total}")]
    CountMismatch { sum: u64, total: u64 },

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
