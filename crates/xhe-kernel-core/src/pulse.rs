//! Pulse: the immutable, sequenced audit record of a kernel operation.
//!
//! A pulse is built from a pre-hash [`PulseRecord`]. The record is encoded
//! canonically and hashed; the hash, the `<sequence>/<hash>` id and the
//! `pulse://` address are derived from it. Pulses are never edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::Address;
use crate::canonical::canonical_hash;
use crate::error::CoreError;
use crate::types::Sequence;

/// The kind of operation a pulse records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PulseKind {
    // Kernel lifecycle
    KernelInit,
    KernelReset,

    // Addressing
    AddressGenerate,
    AddressResolve,
    IndexClear,

    // Identity
    IdentityRegenerate,

    // Ledger
    SlipMint,
    SlipTransfer,

    // Social graph
    Follow,
    Unfollow,
    Block,
    Unblock,

    // Content
    PostCreate,
    PostReply,
    PostRepost,
    ChannelCreate,
    ChannelJoin,
    ChannelLeave,
}

impl PulseKind {
    /// The wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            PulseKind::KernelInit => "KERNEL_INIT",
            PulseKind::KernelReset => "KERNEL_RESET",
            PulseKind::AddressGenerate => "ADDRESS_GENERATE",
            PulseKind::AddressResolve => "ADDRESS_RESOLVE",
            PulseKind::IndexClear => "INDEX_CLEAR",
            PulseKind::IdentityRegenerate => "IDENTITY_REGENERATE",
            PulseKind::SlipMint => "SLIP_MINT",
            PulseKind::SlipTransfer => "SLIP_TRANSFER",
            PulseKind::Follow => "FOLLOW",
            PulseKind::Unfollow => "UNFOLLOW",
            PulseKind::Block => "BLOCK",
            PulseKind::Unblock => "UNBLOCK",
            PulseKind::PostCreate => "POST_CREATE",
            PulseKind::PostReply => "POST_REPLY",
            PulseKind::PostRepost => "POST_REPOST",
            PulseKind::ChannelCreate => "CHANNEL_CREATE",
            PulseKind::ChannelJoin => "CHANNEL_JOIN",
            PulseKind::ChannelLeave => "CHANNEL_LEAVE",
        }
    }
}

/// The pre-hash pulse record.
///
/// This is exactly what gets canonically encoded and hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulseRecord {
    #[serde(rename = "type")]
    pub kind: PulseKind,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub sequence: Sequence,
    pub kernel_version: String,
}

impl PulseRecord {
    /// Compute the hash and derive the full pulse.
    pub fn seal(self) -> Result<Pulse, CoreError> {
        let hash = canonical_hash(&self)?.to_hex();
        let id = pulse_id(self.sequence, &hash);
        let address = Address::pulse(self.sequence, hash.clone()).to_string();
        Ok(Pulse {
            kind: self.kind,
            payload: self.payload,
            timestamp: self.timestamp,
            author: self.author,
            sequence: self.sequence,
            kernel_version: self.kernel_version,
            hash,
            address,
            id,
        })
    }
}

/// A sealed pulse as stored in the pulse log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pulse {
    #[serde(rename = "type")]
    pub kind: PulseKind,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub sequence: Sequence,
    pub kernel_version: String,
    pub hash: String,
    pub address: String,
    pub id: String,
}

impl Pulse {
    /// Rebuild the pre-hash record.
    pub fn record(&self) -> PulseRecord {
        PulseRecord {
            kind: self.kind,
            payload: self.payload.clone(),
            timestamp: self.timestamp,
            author: self.author.clone(),
            sequence: self.sequence,
            kernel_version: self.kernel_version.clone(),
        }
    }

    /// Check that hash, id and address match the record contents.
    pub fn verify(&self) -> bool {
        match self.record().seal() {
            Ok(resealed) => {
                resealed.hash == self.hash
                    && resealed.id == self.id
                    && resealed.address == self.address
            }
            Err(_) => false,
        }
    }
}

/// Build a pulse id from its parts.
pub fn pulse_id(sequence: Sequence, hash: &str) -> String {
    format!("{sequence}/{hash}")
}

/// Builder for pulse records.
#[derive(Debug)]
pub struct PulseBuilder {
    kind: PulseKind,
    payload: Value,
    timestamp: Option<DateTime<Utc>>,
    author: String,
    sequence: Sequence,
    kernel_version: String,
}

impl PulseBuilder {
    /// Start building a pulse of the given kind.
    pub fn new(kind: PulseKind, sequence: Sequence) -> Self {
        Self {
            kind,
            payload: Value::Null,
            timestamp: None,
            author: String::new(),
            sequence,
            kernel_version: String::new(),
        }
    }

    /// Set the payload.
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Set the timestamp.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the authoring identity.
    pub fn author(mut self, did: impl Into<String>) -> Self {
        self.author = did.into();
        self
    }

    /// Set the kernel version stamp.
    pub fn kernel_version(mut self, version: impl Into<String>) -> Self {
        self.kernel_version = version.into();
        self
    }

    /// Build the pre-hash record.
    pub fn build(self) -> PulseRecord {
        PulseRecord {
            kind: self.kind,
            payload: self.payload,
            timestamp: self.timestamp.unwrap_or_else(crate::crypto::now),
            author: self.author,
            sequence: self.sequence,
            kernel_version: self.kernel_version,
        }
    }

    /// Build and seal in one step.
    pub fn seal(self) -> Result<Pulse, CoreError> {
        self.build().seal()
    }
}
