//! Store errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Database(#[from] rusqlite::Error),

    /// A value could not be encoded to or decoded from CBOR.
    #[error("value codec: {0}")]
    Serialization(String),

    /// The on-disk schema cannot be brought to the version this build writes.
    #[error("schema migration: {0}")]
    Migration(String),

    /// The backend refused the operation. The batch was not applied.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
