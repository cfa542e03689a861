//! Self-issued identities and their archival history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::crypto::{generate_public_key, now, random_hex};

/// Reason recorded when the user regenerates their identity.
pub const REGENERATE_REASON: &str = "user-initiated";

/// The kernel's current identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// `did:xhe:<32-hex>` handle.
    pub did: String,
    /// Hex-encoded Ed25519 verifying key.
    pub public_key: String,
    pub created: DateTime<Utc>,
    pub version: u32,
}

impl Identity {
    /// Create a fresh identity with a random handle and new key material.
    pub fn generate(version: u32) -> Self {
        let did = Address::Identity {
            id: random_hex(16),
        }
        .to_string();
        Self {
            did,
            public_key: generate_public_key(),
            created: now(),
            version,
        }
    }

    /// The identity that replaces this one on regeneration.
    pub fn successor(&self) -> Self {
        Self::generate(self.version + 1)
    }

    /// The hex fragment after `did:xhe:`.
    pub fn fragment(&self) -> &str {
        did_fragment(&self.did)
    }
}

/// An identity snapshot archived by regeneration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityHistoryEntry {
    #[serde(flatten)]
    pub identity: Identity,
    pub archived_at: DateTime<Utc>,
    pub reason: String,
}

impl IdentityHistoryEntry {
    /// Archive an identity now.
    pub fn archive(identity: Identity, reason: impl Into<String>) -> Self {
        Self {
            identity,
            archived_at: now(),
            reason: reason.into(),
        }
    }
}

/// The hex fragment of a did, or the did itself when it has no prefix.
pub fn did_fragment(did: &str) -> &str {
    did.strip_prefix("did:xhe:").unwrap_or(did)
}
