//! Export, import and reset.

use std::sync::Arc;

use serde_json::{json, Value};
use xhe_kernel::core::PulseBuilder;
use xhe_kernel::store::MemoryStore;
use xhe_kernel::{
    EventName, GenerateOptions, Kernel, KernelConfig, KernelError, KernelEvent, ObserverError,
    PostOptions, Pulse, PulseKind, Sequence, TruthState, SNAPSHOT_VERSION,
};

const STRANGER: &str = "did:xhe:0123456789abcdef0123456789abcdef";

async fn fresh() -> Kernel<Arc<MemoryStore>> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Kernel::open(Arc::new(MemoryStore::new()), KernelConfig::default())
        .await
        .unwrap()
}

/// A kernel with some of everything.
async fn busy() -> Kernel<Arc<MemoryStore>> {
    let kernel = fresh().await;
    let opts = GenerateOptions::default();
    kernel.generate("hello world", "xhe", opts).await.unwrap();
    kernel.generate("pinned", "ipfs", opts).await.unwrap();
    kernel.mint(10, "seed").await.unwrap();
    kernel.transfer(STRANGER, 25, "gift").await.unwrap();
    kernel.follow(STRANGER).await.unwrap();
    let channel = kernel.create_channel("general", "chat").await.unwrap();
    kernel
        .create_post("hi", PostOptions::in_channel(&channel.id))
        .await
        .unwrap();
    kernel
}

// ─────────────────────────────────────────────────────────────────────────────
// Export
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_export_carries_every_store() {
    let kernel = busy().await;
    let before = kernel.pulses().await.len();

    let exported: Value = serde_json::from_str(&kernel.export().await.unwrap()).unwrap();
    assert_eq!(exported["version"], SNAPSHOT_VERSION);
    for key in [
        "exportedAt",
        "meta",
        "identity",
        "identityHistory",
        "content",
        "pulses",
        "sequence",
        "index",
        "ledger",
        "social",
        "feeds",
        "channels",
        "resetJournal",
    ] {
        assert!(exported.get(key).is_some(), "missing {key}");
    }
    assert_eq!(exported["identity"]["did"], kernel.identity().await.did);
    assert_eq!(exported["pulses"].as_object().unwrap().len(), before);

    // Export is a read.
    assert_eq!(kernel.pulses().await.len(), before);
}

// ─────────────────────────────────────────────────────────────────────────────
// Import
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_export_import_into_reset_kernel_copies_stores() {
    let source = busy().await;
    let exported = source.export().await.unwrap();
    let expected = source.snapshot().await;

    let target = fresh().await;
    target.reset(false).await.unwrap();
    let report = target.import(&exported).await;

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert!(!report.migrated);
    assert!(report.added > 0);

    let actual = target.snapshot().await;
    assert_eq!(actual.index, expected.index);
    assert_eq!(actual.content, expected.content);
    assert_eq!(actual.pulses, expected.pulses);
    assert_eq!(actual.feeds, expected.feeds);
    assert_eq!(actual.channels, expected.channels);
    assert_eq!(actual.ledger.transactions, expected.ledger.transactions);
    assert!(actual.ledger.is_conserved());
}

#[tokio::test]
async fn test_import_emits_no_pulse_and_raises_sequence() {
    let source = busy().await;
    let exported = source.export().await.unwrap();
    let source_seq = source.sequence().await;

    let target = fresh().await;
    let before = target.pulses().await.len();
    target.import(&exported).await;

    let after = target.pulses().await;
    // The source's init pulse shares no id with ours, so all of its pulses land.
    assert_eq!(after.len(), before + source.pulses().await.len());
    assert_eq!(target.sequence().await, source_seq);

    let next = target.mint(1, "after import").await.unwrap();
    let last = target.pulses().await.pop().unwrap();
    assert_eq!(last.payload["txId"], next.id);
    assert_eq!(last.sequence, source_seq.next().unwrap());
}

#[tokio::test]
async fn test_import_keeps_existing_entries() {
    let kernel = busy().await;
    let exported = kernel.export().await.unwrap();
    let before = kernel.snapshot().await;

    let report = kernel.import(&exported).await;
    assert_eq!(report.added, 0);
    assert!(report.errors.is_empty());

    let after = kernel.snapshot().await;
    assert_eq!(after.content, before.content);
    assert_eq!(after.pulses, before.pulses);
    assert_eq!(after.ledger, before.ledger);
    assert_eq!(after.identity, before.identity);
}

#[tokio::test]
async fn test_import_does_not_overwrite_balances() {
    let source = busy().await;
    let exported = source.export().await.unwrap();

    let target = fresh().await;
    target.transfer(STRANGER, 1, "").await.unwrap();
    target.import(&exported).await;

    // The stranger already had an account here; only the source's own did is new.
    assert_eq!(target.balance_of(STRANGER).await, 1);
    let source_did = source.identity().await.did;
    assert_eq!(
        target.balance_of(&source_did).await,
        source.balance().await
    );
    assert_eq!(
        target.total_supply().await,
        100 + source.balance().await
    );
}

#[tokio::test]
async fn test_import_rejects_tampered_pulses() {
    let source = busy().await;
    let mut exported: Value = serde_json::from_str(&source.export().await.unwrap()).unwrap();
    let pulses = exported["pulses"].as_object_mut().unwrap();
    let first = pulses.keys().next().unwrap().clone();
    pulses[&first]["payload"] = json!({ "forged": true });

    let target = fresh().await;
    target.reset(true).await.unwrap();
    let report = target.import(&exported.to_string()).await;

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains(&first));
    assert!(target.pulse(&first).await.is_none());
    assert_eq!(
        target.pulses().await.len(),
        source.pulses().await.len() - 1
    );
}

/// An export of `kernel` with one extra, correctly sealed pulse.
async fn export_with_pulse_at(
    kernel: &Kernel<Arc<MemoryStore>>,
    sequence: u64,
) -> (String, Pulse) {
    let pulse = PulseBuilder::new(PulseKind::Follow, Sequence::new(sequence))
        .payload(json!({ "did": STRANGER }))
        .author(STRANGER)
        .kernel_version("0.1.0")
        .seal()
        .unwrap();
    let mut exported: Value = serde_json::from_str(&kernel.export().await.unwrap()).unwrap();
    exported["pulses"]
        .as_object_mut()
        .unwrap()
        .insert(pulse.id.clone(), serde_json::to_value(&pulse).unwrap());
    (exported.to_string(), pulse)
}

#[tokio::test]
async fn test_import_rejects_pulse_at_last_sequence() {
    let source = busy().await;
    let (exported, pulse) = export_with_pulse_at(&source, u64::MAX).await;

    let target = fresh().await;
    let report = target.import(&exported).await;
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains(&pulse.id));
    assert!(target.pulse(&pulse.id).await.is_none());
    assert_eq!(target.sequence().await, source.sequence().await);

    target.mint(1, "still sequenced").await.unwrap();
}

#[tokio::test]
async fn test_exhausted_sequence_fails_without_changes() {
    let store = Arc::new(MemoryStore::new());
    let kernel = Kernel::open(store.clone(), KernelConfig::default())
        .await
        .unwrap();
    let (exported, _) = export_with_pulse_at(&kernel, u64::MAX - 1).await;
    let report = kernel.import(&exported).await;
    assert!(report.errors.is_empty());

    // One sequence is left.
    kernel.mint(1, "last").await.unwrap();
    assert_eq!(kernel.sequence().await, Sequence::new(u64::MAX));

    let balance = kernel.balance().await;
    let pulses = kernel.pulses().await.len();
    let writes = store.write_count("xhe.ledger");

    assert!(matches!(
        kernel.mint(1, "one too many").await,
        Err(KernelError::SequenceExhausted(u64::MAX))
    ));
    assert!(matches!(
        kernel.transfer(STRANGER, 1, "").await,
        Err(KernelError::SequenceExhausted(_))
    ));
    assert!(matches!(
        kernel.generate("late", "xhe", GenerateOptions::default()).await,
        Err(KernelError::SequenceExhausted(_))
    ));
    assert!(kernel.follow(STRANGER).await.is_err());

    assert_eq!(kernel.balance().await, balance);
    assert_eq!(kernel.balance_of(STRANGER).await, 0);
    assert_eq!(kernel.transactions().await.len(), 1);
    assert_eq!(kernel.pulses().await.len(), pulses);
    assert!(kernel.list_index(None).await.is_empty());
    assert!(!kernel.social_graph().await.following.contains(STRANGER));

    // Nothing half-applied reaches the store either.
    kernel.shutdown().await;
    assert_eq!(store.write_count("xhe.ledger"), writes);
    let kernel = Kernel::open(store, KernelConfig::default()).await.unwrap();
    assert_eq!(kernel.balance().await, balance);
    assert_eq!(kernel.sequence().await, Sequence::new(u64::MAX));
}

#[tokio::test]
async fn test_import_bad_payloads_report_errors() {
    let kernel = fresh().await;
    let before = kernel.snapshot().await;

    let report = kernel.import("{ not json").await;
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.added, 0);

    let report = kernel
        .import(&json!({ "version": "xhe-kernel-snapshot/9" }).to_string())
        .await;
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("xhe-kernel-snapshot/9"));

    let report = kernel
        .import(&json!({ "version": SNAPSHOT_VERSION, "identity": 5 }).to_string())
        .await;
    assert_eq!(report.errors.len(), 1);

    let after = kernel.snapshot().await;
    assert_eq!(after.pulses, before.pulses);
    assert_eq!(after.index, before.index);
}

#[tokio::test]
async fn test_import_legacy_index() {
    let kernel = fresh().await;
    let legacy = json!({
        "version": "1.0",
        "entries": {
            "xhe://abcdef": {
                "hash": "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
                "type": "xhe",
                "timestamp": "2024-01-01T00:00:00Z",
                "preview": "hello world",
            },
            "xhe://0123": { "hash": "nope" },
            "gopher://x": {
                "hash": "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
                "type": "xhe",
                "timestamp": "2024-01-01T00:00:00Z",
                "preview": "",
            },
        }
    });

    let report = kernel.import(&legacy.to_string()).await;
    assert!(report.migrated);
    assert_eq!(report.added, 1);
    assert_eq!(report.errors.len(), 2);

    let entry = kernel.index_entry("xhe://abcdef").await.unwrap();
    assert_eq!(entry.preview, "hello world");
    assert_eq!(
        kernel.resolve("xhe://abcdef").await.state,
        TruthState::KnownButUnavailable
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Reset
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reset_preserving_identity() {
    let kernel = busy().await;
    let identity = kernel.identity().await;
    let sequence = kernel.sequence().await;

    let pulse = kernel.reset(true).await.unwrap();
    assert_eq!(pulse.kind, PulseKind::KernelReset);
    assert_eq!(pulse.sequence, sequence.next().unwrap());
    assert_eq!(pulse.payload, json!({ "preserveIdentity": true }));

    assert_eq!(kernel.identity().await, identity);
    assert_eq!(kernel.balance().await, 0);
    assert!(kernel.transactions().await.is_empty());
    assert!(kernel.pulses().await.is_empty());
    assert!(kernel.own_feed().await.posts.is_empty());
    assert!(kernel.channels().await.is_empty());
    assert!(kernel.list_index(None).await.is_empty());
    assert!(kernel.social_graph().await.following.is_empty());

    assert_eq!(kernel.reset_journal().await, vec![pulse.clone()]);
    assert_eq!(kernel.meta().await.last_reset, Some(pulse.timestamp));
    assert_eq!(kernel.sequence().await, pulse.sequence);
}

#[tokio::test]
async fn test_reset_with_new_identity() {
    let kernel = busy().await;
    let old = kernel.identity().await;
    kernel.regenerate_identity().await.unwrap();

    kernel.reset(false).await.unwrap();
    let new = kernel.identity().await;
    assert_ne!(new.did, old.did);
    assert_eq!(new.version, 1);
    assert!(kernel.identity_history().await.is_empty());
    assert_eq!(
        kernel.resolve(&old.did).await.state,
        TruthState::Unknown
    );
}

#[tokio::test]
async fn test_reset_survives_restart() {
    let store = Arc::new(MemoryStore::new());
    let kernel = Kernel::open(store.clone(), KernelConfig::default())
        .await
        .unwrap();
    kernel.mint(5, "gone").await.unwrap();
    let did = kernel.identity().await.did;
    let reset = kernel.reset(true).await.unwrap();
    kernel.shutdown().await;

    let kernel = Kernel::open(store.clone(), KernelConfig::default())
        .await
        .unwrap();
    assert_eq!(kernel.identity().await.did, did);
    assert!(kernel.pulses().await.is_empty());
    assert!(kernel.transactions().await.is_empty());
    assert_eq!(kernel.reset_journal().await, vec![reset.clone()]);
    assert_eq!(kernel.sequence().await, reset.sequence);
    // The preserved identity already had its genesis grant.
    assert_eq!(kernel.balance().await, 0);
    assert_eq!(kernel.total_supply().await, 0);

    let next = kernel.mint(1, "fresh").await.unwrap();
    let pulse = kernel.pulses().await.pop().unwrap();
    assert_eq!(pulse.payload["txId"], next.id);
    assert_eq!(pulse.sequence, reset.sequence.next().unwrap());
}

#[tokio::test]
async fn test_reopen_after_reset_reproduces_ledger() {
    for preserve_identity in [true, false] {
        let store = Arc::new(MemoryStore::new());
        let kernel = Kernel::open(store.clone(), KernelConfig::default())
            .await
            .unwrap();
        kernel.reset(preserve_identity).await.unwrap();
        let did = kernel.identity().await.did;
        let balance = kernel.balance().await;
        let supply = kernel.total_supply().await;
        let sequence = kernel.sequence().await;
        kernel.shutdown().await;

        let kernel = Kernel::open(store.clone(), KernelConfig::default())
            .await
            .unwrap();
        assert_eq!(kernel.identity().await.did, did);
        assert_eq!(kernel.balance().await, balance, "preserve={preserve_identity}");
        assert_eq!(kernel.total_supply().await, supply);
        assert!(kernel.transactions().await.is_empty());
        assert!(kernel.pulses().await.is_empty());
        assert_eq!(kernel.sequence().await, sequence);
        assert!(kernel.meta().await.genesis_settled.contains(&did));
    }
}

#[tokio::test]
async fn test_regenerated_identity_gets_genesis_once() {
    let store = Arc::new(MemoryStore::new());
    let kernel = Kernel::open(store.clone(), KernelConfig::default())
        .await
        .unwrap();
    let new = kernel.regenerate_identity().await.unwrap();
    assert_eq!(kernel.balance().await, 100);
    assert_eq!(kernel.total_supply().await, 200);
    kernel.shutdown().await;

    let kernel = Kernel::open(store, KernelConfig::default())
        .await
        .unwrap();
    assert_eq!(kernel.identity().await.did, new.did);
    assert_eq!(kernel.balance().await, 100);
    assert_eq!(kernel.total_supply().await, 200);
}

#[tokio::test]
async fn test_reset_notifies_listeners() {
    let kernel = fresh().await;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let _sub = kernel.on(
        EventName::KernelReset,
        move |event: &KernelEvent| -> Result<(), ObserverError> {
            tx.send(event.clone())
                .map_err(|e| ObserverError(e.to_string()))
        },
    );

    kernel.reset(false).await.unwrap();
    assert_eq!(
        rx.try_recv().unwrap(),
        KernelEvent::KernelReset {
            preserve_identity: false
        }
    );
}
