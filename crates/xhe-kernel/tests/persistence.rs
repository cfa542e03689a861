//! Restart behavior: reopening a kernel over the same store.

use std::sync::Arc;

use xhe_kernel::store::{MemoryStore, SqliteStore, Store};
use xhe_kernel::{GenerateOptions, Kernel, KernelConfig, PostOptions, PulseKind, TruthState};

const STRANGER: &str = "did:xhe:0123456789abcdef0123456789abcdef";

async fn open<S: Store>(store: S) -> Kernel<S> {
    Kernel::open(store, KernelConfig::default()).await.unwrap()
}

#[tokio::test]
async fn test_reopen_is_idempotent() {
    let store = Arc::new(MemoryStore::new());

    let kernel = open(store.clone()).await;
    let identity = kernel.identity().await;
    let generated = kernel
        .generate("remember me", "xhe", GenerateOptions::default())
        .await
        .unwrap();
    kernel.transfer(STRANGER, 40, "").await.unwrap();
    kernel.follow(STRANGER).await.unwrap();
    kernel
        .create_post("persisted", PostOptions::default())
        .await
        .unwrap();
    let pulses = kernel.pulses().await;
    let stats = kernel.stats().await;
    kernel.shutdown().await;

    let kernel = open(store.clone()).await;
    assert_eq!(kernel.identity().await, identity);
    assert_eq!(kernel.pulses().await, pulses);
    assert_eq!(kernel.stats().await, stats);
    assert_eq!(kernel.balance().await, 60);
    assert_eq!(kernel.total_supply().await, 100);
    assert_eq!(kernel.meta().await.boots, 2);
    assert_eq!(
        kernel.resolve(&generated.address).await.state,
        TruthState::Resolved
    );

    // No second init and no second genesis grant.
    let inits = kernel
        .pulses()
        .await
        .iter()
        .filter(|p| p.kind == PulseKind::KernelInit)
        .count();
    assert_eq!(inits, 1);
}

#[tokio::test]
async fn test_sequence_continues_after_restart() {
    let store = Arc::new(MemoryStore::new());

    let kernel = open(store.clone()).await;
    kernel.mint(1, "a").await.unwrap();
    drop(kernel);

    let kernel = open(store.clone()).await;
    kernel.mint(1, "b").await.unwrap();

    let sequences: Vec<u64> = kernel
        .pulses()
        .await
        .iter()
        .map(|p| p.sequence.value())
        .collect();
    assert_eq!(sequences, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_one_commit_per_operation() {
    let store = Arc::new(MemoryStore::new());
    let kernel = open(store.clone()).await;

    let commits = store.commit_count();
    kernel.transfer(STRANGER, 5, "").await.unwrap();
    assert_eq!(store.commit_count(), commits + 1);
    assert_eq!(store.write_count("xhe.ledger"), 2);
}

#[tokio::test]
async fn test_failed_commit_is_retried() {
    let store = Arc::new(MemoryStore::new());
    let kernel = open(store.clone()).await;

    store.set_fail_writes(true);
    kernel.mint(10, "while down").await.unwrap();
    assert_eq!(kernel.balance().await, 110);

    store.set_fail_writes(false);
    kernel.follow(STRANGER).await.unwrap();
    drop(kernel);

    let kernel = open(store.clone()).await;
    assert_eq!(kernel.balance().await, 110);
    assert_eq!(kernel.transactions().await.len(), 1);
    assert_eq!(kernel.social_graph().await.following.len(), 1);
    assert_eq!(kernel.sequence().await.value(), 3);
}

#[tokio::test]
async fn test_corrupt_key_falls_back_to_default() {
    let store = Arc::new(MemoryStore::new());
    let kernel = open(store.clone()).await;
    kernel.follow(STRANGER).await.unwrap();
    let did = kernel.identity().await.did;
    drop(kernel);

    store.insert_raw("xhe.social", bytes::Bytes::from_static(b"\xff\x00garbage"));

    let kernel = open(store.clone()).await;
    assert_eq!(kernel.identity().await.did, did);
    assert!(kernel.social_graph().await.following.is_empty());
}

#[tokio::test]
async fn test_sequence_counter_catches_up_with_log() {
    let store = Arc::new(MemoryStore::new());
    let kernel = open(store.clone()).await;
    kernel.mint(1, "a").await.unwrap();
    kernel.mint(1, "b").await.unwrap();
    drop(kernel);

    // A stale counter must never hand out a sequence twice.
    store.insert_raw("xhe.pulse.sequence", xhe_kernel::store::codec::encode(&1u64).unwrap());

    let kernel = open(store.clone()).await;
    assert_eq!(kernel.sequence().await.value(), 3);
    kernel.mint(1, "c").await.unwrap();
    assert_eq!(kernel.sequence().await.value(), 4);
}

#[tokio::test]
async fn test_sqlite_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kernel.db");

    let (did, address) = {
        let kernel = open(SqliteStore::open(&path).unwrap()).await;
        let generated = kernel
            .generate("on disk", "xhe", GenerateOptions::default())
            .await
            .unwrap();
        kernel.mint(7, "disk").await.unwrap();
        let did = kernel.identity().await.did;
        kernel.shutdown().await;
        (did, generated.address)
    };

    let kernel = open(SqliteStore::open(&path).unwrap()).await;
    assert_eq!(kernel.identity().await.did, did);
    assert_eq!(kernel.balance().await, 107);
    assert_eq!(kernel.resolve(&address).await.state, TruthState::Resolved);
    assert_eq!(kernel.pulses().await.len(), 4);
}
