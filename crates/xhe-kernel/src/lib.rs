//! # XHE Kernel
//!
//! A local-first personal data kernel: one identity, a content-addressed
//! store, an append-only pulse audit log, a slip ledger and a social graph.
//!
//! ## Overview
//!
//! - **Addresses**: `xhe://`, `did:xhe:`, `pulse://`, `ipfs://`, `slip://`,
//!   `feed://` and `channel://` URIs derived from SHA-256 content hashes
//! - **Resolution**: Any address resolves to a truth state (`RESOLVED`,
//!   `KNOWN_BUT_UNAVAILABLE`, `UNKNOWN`, `INVALID`), and every resolution of
//!   a well-formed address is itself audited
//! - **Pulses**: Every state-changing operation appends exactly one pulse,
//!   numbered by a strictly increasing sequence that survives reset
//! - **Persistence**: All keys touched by one operation commit in one batch
//!
//! ## Usage
//!
//! ```rust,no_run
//! use xhe_kernel::{GenerateOptions, Kernel, KernelConfig, TruthState};
//! use xhe_kernel::store::SqliteStore;
//!
//! async fn example() -> xhe_kernel::Result<()> {
//!     let store = SqliteStore::open("kernel.db")?;
//!     let kernel = Kernel::open(store, KernelConfig::default()).await?;
//!
//!     let generated = kernel
//!         .generate("hello world", "xhe", GenerateOptions::default())
//!         .await?;
//!     let resolution = kernel.resolve(&generated.address).await;
//!     assert_eq!(resolution.state, TruthState::Resolved);
//!
//!     kernel.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `xhe_kernel::core` - Addresses, pulses, ledger and social primitives
//! - `xhe_kernel::store` - Storage abstraction, memory and SQLite stores

pub mod address;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod kernel;
pub mod ledger;
pub mod resolver;
pub mod snapshot;
pub mod social;
mod state;

// Re-export component crates
pub use xhe_kernel_core as core;
pub use xhe_kernel_store as store;

// Re-export main types for convenience
pub use address::{GenerateOptions, Generated};
pub use config::KernelConfig;
pub use error::{KernelError, Result};
pub use events::{EventName, KernelEvent, Observer, ObserverError, Subscription};
pub use kernel::Kernel;
pub use snapshot::{ImportReport, Snapshot, SNAPSHOT_VERSION};
pub use state::KernelMeta;

// Re-export commonly used core types
pub use xhe_kernel_core::{
    Address, AddressIndexEntry, Channel, ContentEntry, ContentHash, Feed, Identity,
    IdentityHistoryEntry, IndexedAddress, KernelStats, Post, PostOptions, Pulse, PulseKind,
    Relation, Resolution, ResolutionMeta, Resolved, Scheme, Sequence, SocialGraph, Transaction,
    TransactionKind, TruthState,
};
