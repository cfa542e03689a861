//! Store trait: the abstract interface for durable kernel state.
//!
//! This trait allows the kernel to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::codec;
use crate::error::Result;
use crate::keys::StoreKey;

/// One mutation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put { key: String, value: Bytes },
    Delete { key: String },
}

impl WriteOp {
    /// The key this operation touches.
    pub fn key(&self) -> &str {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Delete { key } => key,
        }
    }
}

/// An ordered set of mutations applied atomically.
///
/// Operations apply in insertion order, so a later operation on the same key
/// wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw put.
    pub fn put(&mut self, key: impl Into<String>, value: Bytes) -> &mut Self {
        self.ops.push(WriteOp::Put {
            key: key.into(),
            value,
        });
        self
    }

    /// Encode a value and queue it under a durable key.
    pub fn put_value<T: Serialize + ?Sized>(
        &mut self,
        key: StoreKey,
        value: &T,
    ) -> Result<&mut Self> {
        let bytes = codec::encode(value)?;
        Ok(self.put(key.as_str(), bytes))
    }

    /// Queue a delete.
    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete { key: key.into() });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The queued operations.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// The Store trait: async interface over whole-value blobs.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, `spawn_blocking` is used internally to avoid blocking the
/// runtime.
///
/// A [`WriteBatch`] is all-or-nothing: after a failed `commit` every key
/// holds the value it had before.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the blob under `key`.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Apply a batch atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// All keys currently present, sorted.
    async fn keys(&self) -> Result<Vec<String>>;
}

#[async_trait]
impl<T: Store + ?Sized> Store for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        (**self).get(key).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        (**self).commit(batch).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        (**self).keys().await
    }
}

/// Extension trait for typed access to durable keys.
pub trait StoreExt: Store {
    /// Load and decode the value under `key`.
    fn load<T: DeserializeOwned + Send>(
        &self,
        key: StoreKey,
    ) -> impl Future<Output = Result<Option<T>>> + Send;

    /// Load a value, substituting the default when it is missing or unreadable.
    ///
    /// Read and decode failures are logged and swallowed.
    fn load_or_default<T: DeserializeOwned + Default + Send>(
        &self,
        key: StoreKey,
    ) -> impl Future<Output = T> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn load<T: DeserializeOwned + Send>(&self, key: StoreKey) -> Result<Option<T>> {
        match self.get(key.as_str()).await? {
            Some(bytes) => codec::decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn load_or_default<T: DeserializeOwned + Default + Send>(&self, key: StoreKey) -> T {
        match self.load(key).await {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                warn!(key = %key, error = %e, "failed to load store, using default");
                T::default()
            }
        }
    }
}
