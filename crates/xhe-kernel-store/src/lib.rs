//! # XHE Kernel Store
//!
//! Durable key-value storage for the XHE Kernel. Provides a trait-based
//! interface over whole-value blobs with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The kernel keeps each of its stores (identity, content, pulses, ledger,
//! ...) as one CBOR blob under a fixed [`StoreKey`]. Every logical operation
//! writes the keys it touched in a single [`WriteBatch`], which the backend
//! applies atomically.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`WriteBatch`] - Atomic multi-key mutation
//! - [`StoreKey`] - Durable key names
//!
//! ## Usage
//!
//! ```rust,no_run
//! use xhe_kernel_store::{SqliteStore, Store, StoreExt, StoreKey, WriteBatch};
//!
//! async fn example() {
//!     let store = SqliteStore::open("kernel.db").unwrap();
//!
//!     let mut batch = WriteBatch::new();
//!     batch.put_value(StoreKey::PulseSequence, &1u64).unwrap();
//!     store.commit(batch).await.unwrap();
//!
//!     let seq: u64 = store.load_or_default(StoreKey::PulseSequence).await;
//!     assert_eq!(seq, 1);
//! }
//! ```

pub mod codec;
pub mod error;
pub mod keys;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use keys::StoreKey;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Store, StoreExt, WriteBatch, WriteOp};
