//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence. Sharing one
//! `Arc<MemoryStore>` between kernels simulates a restart.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::traits::{Store, WriteBatch, WriteOp};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
    fail_writes: AtomicBool,
}

#[derive(Default)]
struct MemoryStoreInner {
    values: BTreeMap<String, Bytes>,
    /// Number of committed puts per key.
    writes: HashMap<String, u64>,
    commits: u64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent commit fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// How many committed puts have targeted `key`.
    pub fn write_count(&self, key: &str) -> u64 {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.writes.get(key).copied().unwrap_or(0)
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> u64 {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .commits
    }

    /// Overwrite a raw value outside any batch accounting.
    pub fn insert_raw(&self, key: impl Into<String>, value: Bytes) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.values.insert(key.into(), value);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.values.get(key).cloned())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        for op in batch.into_ops() {
            match op {
                WriteOp::Put { key, value } => {
                    *inner.writes.entry(key.clone()).or_insert(0) += 1;
                    inner.values.insert(key, value);
                }
                WriteOp::Delete { key } => {
                    inner.values.remove(&key);
                }
            }
        }
        inner.commits += 1;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.values.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::StoreKey;
    use crate::traits::StoreExt;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.put("a", Bytes::from_static(b"1"));
        batch.put("b", Bytes::from_static(b"2"));
        store.commit(batch).await.unwrap();

        assert_eq!(store.get("a").await.unwrap().unwrap(), Bytes::from_static(b"1"));
        assert_eq!(store.keys().await.unwrap(), vec!["a", "b"]);

        let mut batch = WriteBatch::new();
        batch.delete("a");
        store.commit(batch).await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_later_op_wins() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.put("k", Bytes::from_static(b"old"));
        batch.delete("k");
        batch.put("k", Bytes::from_static(b"new"));
        store.commit(batch).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().unwrap(), Bytes::from_static(b"new"));
        assert_eq!(store.write_count("k"), 2);
    }

    #[tokio::test]
    async fn test_failed_commit_changes_nothing() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let mut batch = WriteBatch::new();
        batch.put("k", Bytes::from_static(b"v"));
        assert!(store.commit(batch).await.is_err());
        assert!(store.keys().await.unwrap().is_empty());
        assert_eq!(store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_typed_load() {
        let store = Arc::new(MemoryStore::new());
        let mut batch = WriteBatch::new();
        batch.put_value(StoreKey::PulseSequence, &7u64).unwrap();
        store.commit(batch).await.unwrap();

        let seq: Option<u64> = store.load(StoreKey::PulseSequence).await.unwrap();
        assert_eq!(seq, Some(7));
        let missing: Option<u64> = store.load(StoreKey::Ledger).await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_load_or_default_swallows_corruption() {
        let store = MemoryStore::new();
        store.insert_raw(StoreKey::Social.as_str(), Bytes::from_static(b"\xff\xfe"));
        let value: Vec<String> = store.load_or_default(StoreKey::Social).await;
        assert!(value.is_empty());
        assert!(store.load::<Vec<String>>(StoreKey::Social).await.is_err());
    }
}
