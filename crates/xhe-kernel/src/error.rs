//! Error types for the Kernel.

use thiserror::Error;
use xhe_kernel_core::{CoreError, LedgerError, SocialError, ValidationError};
use xhe_kernel_store::StoreError;

/// Errors that can occur during Kernel operations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Address generation requested for an unsupported scheme.
    #[error("unknown scheme: {0}")]
    UnknownScheme(String),

    /// Transfer exceeds the sender's balance.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: u64, requested: u64 },

    /// Following or blocking the kernel's own identity.
    #[error("cannot follow or block your own identity")]
    SelfFollow,

    /// Following a blocked identity.
    #[error("identity is blocked: {0}")]
    BlockedIdentity(String),

    /// Channel not found.
    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    /// Invalid operation.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The pulse log has no sequence left to hand out. Nothing was changed.
    #[error("pulse sequence exhausted at {0}")]
    SequenceExhausted(u64),

    /// Record encoding error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<LedgerError> for KernelError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NonPositiveAmount => {
                KernelError::Validation(ValidationError::NonPositiveAmount)
            }
            LedgerError::InsufficientBalance {
                available,
                requested,
            } => KernelError::InsufficientBalance {
                available,
                requested,
            },
            LedgerError::Overflow => KernelError::InvalidOperation(err.to_string()),
        }
    }
}

impl From<SocialError> for KernelError {
    fn from(err: SocialError) -> Self {
        match err {
            SocialError::SelfFollow => KernelError::SelfFollow,
            SocialError::Blocked(did) => KernelError::BlockedIdentity(did),
        }
    }
}

impl From<CoreError> for KernelError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SequenceExhausted(last) => KernelError::SequenceExhausted(last),
            CoreError::EncodingError(msg) => KernelError::Serialization(msg),
        }
    }
}

impl From<serde_json::Error> for KernelError {
    fn from(err: serde_json::Error) -> Self {
        KernelError::Serialization(err.to_string())
    }
}

/// Result type for Kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
