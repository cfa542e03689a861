//! Error types for the XHE Kernel Core.

use thiserror::Error;

/// Core errors that can occur while encoding kernel records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    /// The pulse counter cannot advance past this value.
    #[error("pulse sequence exhausted at {0}")]
    SequenceExhausted(u64),
}

/// Validation errors for caller-supplied input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("content must not be empty")]
    EmptyContent,

    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("invalid identity address: {0}")]
    InvalidDid(String),
}

/// Reasons an address string fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("unrecognized address prefix: {0}")]
    UnknownPrefix(String),

    #[error("address has an empty {0} component")]
    EmptyComponent(&'static str),

    #[error("{0} component is not lowercase hex")]
    NotHex(&'static str),

    #[error("invalid pulse sequence: {0}")]
    InvalidSequence(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

/// Ledger state transition errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: u64, requested: u64 },

    #[error("balance overflow")]
    Overflow,
}

/// Social graph errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocialError {
    #[error("cannot follow or block yourself")]
    SelfFollow,

    #[error("identity is blocked: {0}")]
    Blocked(String),
}
