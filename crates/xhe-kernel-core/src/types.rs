//! Strong type definitions for the XHE Kernel.
//!
//! Small newtypes and enums shared by every record type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AddressError, CoreError};

/// Width of the zero-padded textual sequence.
pub const SEQUENCE_WIDTH: usize = 8;

/// A pulse sequence number.
///
/// Sequences start at 1 and render as 8-digit zero-padded decimal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Sequence(pub u64);

impl Sequence {
    /// The sequence before any pulse has been emitted.
    pub const ZERO: Self = Self(0);

    /// Create from a raw counter value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw counter value.
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The sequence that follows this one, if the counter has room.
    pub fn next(&self) -> Result<Self, CoreError> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(CoreError::SequenceExhausted(self.0))
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sequence({})", self.0)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = SEQUENCE_WIDTH)
    }
}

impl FromStr for Sequence {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AddressError::InvalidSequence(s.to_string()));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| AddressError::InvalidSequence(s.to_string()))
    }
}

impl From<Sequence> for String {
    fn from(seq: Sequence) -> Self {
        seq.to_string()
    }
}

impl TryFrom<String> for Sequence {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Address schemes understood by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Scheme {
    /// Kernel content: `xhe://<hash>`.
    Content,
    /// Identity: `did:xhe:<hex>`.
    Identity,
    /// Audit pulse: `pulse://<sequence>/<hash>`.
    Pulse,
    /// External content: `ipfs://<hash>`.
    External,
    /// Ledger entry: `slip://<id>`.
    Slip,
    /// Personal feed: `feed://<id>`.
    Feed,
    /// Channel: `channel://<id>`.
    Channel,
}

impl Scheme {
    /// Every scheme, in grammar order.
    pub const ALL: [Scheme; 7] = [
        Scheme::Content,
        Scheme::Identity,
        Scheme::Pulse,
        Scheme::External,
        Scheme::Slip,
        Scheme::Feed,
        Scheme::Channel,
    ];

    /// The scheme name as callers spell it.
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Content => "xhe",
            Scheme::Identity => "did:xhe",
            Scheme::Pulse => "pulse",
            Scheme::External => "ipfs",
            Scheme::Slip => "slip",
            Scheme::Feed => "feed",
            Scheme::Channel => "channel",
        }
    }

    /// Whether `generate` can mint addresses of this scheme.
    pub fn is_generatable(self) -> bool {
        matches!(
            self,
            Scheme::Content | Scheme::Identity | Scheme::Pulse | Scheme::External
        )
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scheme::ALL
            .into_iter()
            .find(|scheme| scheme.as_str() == s)
            .ok_or_else(|| AddressError::UnknownPrefix(s.to_string()))
    }
}

impl From<Scheme> for String {
    fn from(scheme: Scheme) -> Self {
        scheme.as_str().to_string()
    }
}

impl TryFrom<String> for Scheme {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
