//! Durable key names.
//!
//! Each key holds one whole-value blob. The kernel rewrites a key in full
//! whenever the store it names changes.

use std::fmt;

/// A durable store key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreKey {
    /// Kernel metadata (created, last active, boots).
    Kernel,
    Identity,
    IdentityHistory,
    Content,
    Pulses,
    /// The pulse sequence counter, kept apart from the pulse log.
    PulseSequence,
    Index,
    Ledger,
    Social,
    Feeds,
    Channels,
    /// Reset audit pulses; survives reset.
    ResetJournal,
}

impl StoreKey {
    /// Every key, in a stable order.
    pub const ALL: [StoreKey; 12] = [
        StoreKey::Kernel,
        StoreKey::Identity,
        StoreKey::IdentityHistory,
        StoreKey::Content,
        StoreKey::Pulses,
        StoreKey::PulseSequence,
        StoreKey::Index,
        StoreKey::Ledger,
        StoreKey::Social,
        StoreKey::Feeds,
        StoreKey::Channels,
        StoreKey::ResetJournal,
    ];

    /// The durable key string.
    pub const fn as_str(self) -> &'static str {
        match self {
            StoreKey::Kernel => "xhe.kernel",
            StoreKey::Identity => "xhe.identity",
            StoreKey::IdentityHistory => "xhe.identity.history",
            StoreKey::Content => "xhe.content",
            StoreKey::Pulses => "xhe.pulses",
            StoreKey::PulseSequence => "xhe.pulse.sequence",
            StoreKey::Index => "xhe.index",
            StoreKey::Ledger => "xhe.ledger",
            StoreKey::Social => "xhe.social",
            StoreKey::Feeds => "xhe.feeds",
            StoreKey::Channels => "xhe.channels",
            StoreKey::ResetJournal => "xhe.reset.journal",
        }
    }

    /// Look up a key by its durable string.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }

    /// Whether a reset keeps this key.
    ///
    /// Identity keys survive only when the caller asks to preserve identity.
    pub fn survives_reset(self, preserve_identity: bool) -> bool {
        match self {
            StoreKey::Kernel | StoreKey::PulseSequence | StoreKey::ResetJournal => true,
            StoreKey::Identity | StoreKey::IdentityHistory => preserve_identity,
            _ => false,
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for StoreKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
