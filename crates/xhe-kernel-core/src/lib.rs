//! # XHE Kernel Core
//!
//! Pure primitives for the XHE kernel: addresses, pulses, identities, and the
//! ledger and social state machines.
//!
//! This crate contains no I/O and no storage. It is pure computation over
//! content-addressed data structures.
//!
//! ## Key Types
//!
//! - [`Address`] - Parsed form of every supported address scheme
//! - [`ContentHash`] - SHA-256 content hash
//! - [`Pulse`] - The sequenced, hash-sealed audit record
//! - [`LedgerState`] - Balances and transactions
//! - [`SocialGraph`] - Follow and block sets
//!
//! ## Canonicalization
//!
//! Pulse hashes are computed over canonical JSON. See [`canonical`] module.

pub mod address;
pub mod canonical;
pub mod content;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod pulse;
pub mod resolution;
pub mod social;
pub mod types;
pub mod validation;

pub use address::Address;
pub use canonical::{canonical_hash, canonical_json};
pub use content::{preview, AddressIndexEntry, ContentEntry, IndexedAddress};
pub use crypto::{now, random_hex, ContentHash};
pub use error::{AddressError, CoreError, LedgerError, SocialError, ValidationError};
pub use identity::{Identity, IdentityHistoryEntry};
pub use ledger::{LedgerState, Transaction, TransactionKind, GENESIS_BALANCE};
pub use pulse::{Pulse, PulseBuilder, PulseKind, PulseRecord};
pub use resolution::{
    IdentityProfile, KernelStats, Resolution, ResolutionMeta, Resolved, TruthState,
};
pub use social::{global_feed, Channel, Feed, Post, PostOptions, Relation, SocialGraph};
pub use types::{Scheme, Sequence};
pub use validation::{validate_amount, validate_content, validate_did};
