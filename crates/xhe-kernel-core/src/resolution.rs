//! Resolution results and kernel statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{AddressIndexEntry, ContentEntry};
use crate::identity::{Identity, IdentityHistoryEntry};
use crate::ledger::Transaction;
use crate::pulse::Pulse;
use crate::social::{Channel, Feed, Relation};
use crate::types::Scheme;

/// Outcome classification of an address resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TruthState {
    /// The address maps to stored content.
    Resolved,
    /// The address is recognized but its content is not held here.
    KnownButUnavailable,
    /// Well-formed but nothing is known about it.
    Unknown,
    /// Reserved for access control; never produced.
    Forbidden,
    /// The address failed to parse.
    Invalid,
}

/// Public view of an identity with its live balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProfile {
    pub did: String,
    pub public_key: String,
    pub created: DateTime<Utc>,
    pub version: u32,
    pub balance: u64,
}

impl IdentityProfile {
    /// Build a profile from an identity and its balance.
    pub fn new(identity: &Identity, balance: u64) -> Self {
        Self {
            did: identity.did.clone(),
            public_key: identity.public_key.clone(),
            created: identity.created,
            version: identity.version,
            balance,
        }
    }
}

/// The typed content a resolution produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Resolved {
    Content(ContentEntry),
    Identity(IdentityProfile),
    Pulse(Pulse),
    Transaction(Transaction),
    Feed(Feed),
    Channel(Channel),
}

/// Extra facts gathered while resolving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_entry: Option<AddressIndexEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<IdentityHistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<Relation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<u64>,
}

/// Result of resolving an address.
///
/// `audit_pulse` is kept apart from the outcome so that two resolutions of
/// the same address with no mutation in between compare equal on
/// [`Resolution::outcome_eq`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub state: TruthState,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Resolved>,
    #[serde(default)]
    pub metadata: ResolutionMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_pulse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Resolution {
    /// A resolution for a well-formed address.
    pub fn new(state: TruthState, address: impl Into<String>, scheme: Scheme) -> Self {
        Self {
            state,
            address: address.into(),
            content: None,
            metadata: ResolutionMeta {
                scheme: Some(scheme),
                ..ResolutionMeta::default()
            },
            audit_pulse: None,
            error: None,
        }
    }

    /// A resolution for an address that failed to parse.
    pub fn invalid(address: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            state: TruthState::Invalid,
            address: address.into(),
            content: None,
            metadata: ResolutionMeta::default(),
            audit_pulse: None,
            error: Some(error.into()),
        }
    }

    /// Attach resolved content.
    pub fn with_content(mut self, content: Resolved) -> Self {
        self.content = Some(content);
        self
    }

    /// Whether state, content and metadata match, ignoring the audit pulse.
    pub fn outcome_eq(&self, other: &Resolution) -> bool {
        self.state == other.state
            && self.address == other.address
            && self.content == other.content
            && self.metadata == other.metadata
            && self.error == other.error
    }

    pub fn is_resolved(&self) -> bool {
        self.state == TruthState::Resolved
    }
}

/// Summary counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KernelStats {
    pub pulse_count: usize,
    pub address_count: usize,
    pub content_count: usize,
    pub balance: u64,
    pub following_count: usize,
    pub post_count: usize,
    pub channel_count: usize,
    pub sequence: u64,
}
