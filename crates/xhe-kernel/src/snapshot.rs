//! Export, import and reset.
//!
//! A snapshot is one JSON document holding every store. Import merges with
//! "keep existing, add missing" semantics and emits no pulse, so exporting
//! and importing into an emptied kernel reproduces the exporter's stores.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use xhe_kernel_core::{
    now, Address, AddressIndexEntry, Channel, ContentEntry, ContentHash, Feed, Identity,
    IdentityHistoryEntry, LedgerState, Pulse, PulseKind, Sequence, SocialGraph,
};
use xhe_kernel_store::{Store, StoreKey};

use crate::error::Result;
use crate::events::KernelEvent;
use crate::kernel::Kernel;
use crate::state::{KernelMeta, KernelState};

/// Version tag of the current snapshot format.
pub const SNAPSHOT_VERSION: &str = "xhe-kernel-snapshot/2";

/// Every store of a kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub meta: KernelMeta,
    pub identity: Identity,
    #[serde(default)]
    pub identity_history: Vec<IdentityHistoryEntry>,
    #[serde(default)]
    pub content: BTreeMap<ContentHash, ContentEntry>,
    #[serde(default)]
    pub pulses: BTreeMap<String, Pulse>,
    #[serde(default)]
    pub sequence: u64,
    #[serde(default)]
    pub index: BTreeMap<String, AddressIndexEntry>,
    #[serde(default)]
    pub ledger: LedgerState,
    #[serde(default)]
    pub social: SocialGraph,
    #[serde(default)]
    pub feeds: BTreeMap<String, Feed>,
    #[serde(default)]
    pub channels: BTreeMap<String, Channel>,
    #[serde(default)]
    pub reset_journal: Vec<Pulse>,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Entries added across all stores.
    pub added: usize,
    /// The payload was in the legacy index-only format.
    pub migrated: bool,
    /// Rejected entries and payload problems.
    pub errors: Vec<String>,
}

impl<S: Store> Kernel<S> {
    /// Capture every store.
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.lock().await;
        Snapshot {
            version: SNAPSHOT_VERSION.to_string(),
            exported_at: now(),
            meta: state.meta.clone(),
            identity: state.identity.clone(),
            identity_history: state.history.clone(),
            content: state.content.clone(),
            pulses: state.pulses.clone(),
            sequence: state.sequence.value(),
            index: state.index.clone(),
            ledger: state.ledger.clone(),
            social: state.social.clone(),
            feeds: state.feeds.clone(),
            channels: state.channels.clone(),
            reset_journal: state.reset_journal.clone(),
        }
    }

    /// Serialize every store to a JSON snapshot.
    pub async fn export(&self) -> Result<String> {
        let snapshot = self.snapshot().await;
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Merge a JSON snapshot into this kernel.
    ///
    /// Never fails: malformed payloads and rejected entries are listed in
    /// [`ImportReport::errors`].
    pub async fn import(&self, json: &str) -> ImportReport {
        let mut report = ImportReport::default();

        let value: Value = match serde_json::from_str(json) {
            Ok(value) => value,
            Err(e) => {
                report.errors.push(format!("malformed snapshot: {e}"));
                warn!(error = %e, "rejected malformed snapshot");
                return report;
            }
        };

        let version = value
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let mut state = self.lock().await;
        if version.as_deref() == Some(SNAPSHOT_VERSION) {
            match serde_json::from_value::<Snapshot>(value) {
                Ok(snapshot) => merge_snapshot(&mut state, snapshot, &mut report),
                Err(e) => report.errors.push(format!("invalid snapshot: {e}")),
            }
        } else if let Some(entries) = value.get("entries").and_then(Value::as_object) {
            merge_legacy(&mut state, entries, &mut report);
            report.migrated = true;
        } else {
            report.errors.push(format!(
                "unsupported snapshot version: {}",
                version.as_deref().unwrap_or("<none>")
            ));
        }
        self.persist(&mut state).await;

        info!(
            added = report.added,
            migrated = report.migrated,
            errors = report.errors.len(),
            "snapshot imported"
        );
        report
    }

    /// Wipe the kernel.
    ///
    /// Emits `KERNEL_RESET` and keeps it in the reset journal. Metadata, the
    /// sequence counter and the journal always survive; identity and history
    /// survive only with `preserve_identity`. The ledger comes back empty and
    /// the remaining identity's genesis grant is waived.
    pub async fn reset(&self, preserve_identity: bool) -> Result<Pulse> {
        let mut state = self.begin().await?;
        let pulse = state.emit(
            PulseKind::KernelReset,
            json!({ "preserveIdentity": preserve_identity }),
        )?;
        state.reset_journal.push(pulse.clone());
        state.mark(StoreKey::ResetJournal);

        state.content.clear();
        state.pulses.clear();
        state.index.clear();
        state.ledger = LedgerState::default();
        state.social = SocialGraph::default();
        state.feeds.clear();
        state.channels.clear();
        for key in StoreKey::ALL {
            if !key.survives_reset(preserve_identity) {
                state.wipe(key);
            }
        }

        if !preserve_identity {
            state.history.clear();
            state.identity = Identity::generate(1);
            state.mark(StoreKey::Identity);
        }
        // The surviving identity starts from an empty ledger, now and after
        // any later boot.
        let did = state.identity.did.clone();
        state.meta.genesis_settled.insert(did);

        state.meta.last_reset = Some(pulse.timestamp);
        state.mark(StoreKey::Kernel);
        state.notify(KernelEvent::KernelReset { preserve_identity });
        self.persist(&mut state).await;

        info!(preserve_identity, did = %state.identity.did, "kernel reset");
        Ok(pulse)
    }
}

fn merge_snapshot(state: &mut KernelState, snapshot: Snapshot, report: &mut ImportReport) {
    let mut added = 0;

    let mut history_added = false;
    for entry in snapshot.identity_history {
        let known = state.history.iter().any(|e| {
            e.identity.did == entry.identity.did && e.archived_at == entry.archived_at
        });
        if !known {
            state.history.push(entry);
            history_added = true;
            added += 1;
        }
    }
    if history_added {
        state.mark(StoreKey::IdentityHistory);
    }

    let n = merge_missing(&mut state.content, snapshot.content);
    if n > 0 {
        state.mark(StoreKey::Content);
        added += n;
    }

    let mut highest = Sequence::ZERO;
    let mut pulses_added = 0;
    for (id, pulse) in snapshot.pulses {
        if state.pulses.contains_key(&id) {
            continue;
        }
        if id != pulse.id || !pulse.verify() {
            report.errors.push(format!("pulse {id}: hash does not match record"));
            continue;
        }
        if let Err(e) = pulse.sequence.next() {
            report.errors.push(format!("pulse {id}: {e}"));
            continue;
        }
        highest = highest.max(pulse.sequence);
        state.pulses.insert(id, pulse);
        pulses_added += 1;
    }
    if pulses_added > 0 {
        state.mark(StoreKey::Pulses);
        added += pulses_added;
    }

    let mut journal_added = false;
    for pulse in snapshot.reset_journal {
        if state.reset_journal.iter().any(|p| p.id == pulse.id) {
            continue;
        }
        if !pulse.verify() {
            report
                .errors
                .push(format!("reset pulse {}: hash does not match record", pulse.id));
            continue;
        }
        if let Err(e) = pulse.sequence.next() {
            report.errors.push(format!("reset pulse {}: {e}", pulse.id));
            continue;
        }
        highest = highest.max(pulse.sequence);
        state.reset_journal.push(pulse);
        journal_added = true;
        added += 1;
    }
    if journal_added {
        state.reset_journal.sort_by_key(|p| p.sequence);
        state.mark(StoreKey::ResetJournal);
    }

    if highest > state.sequence {
        state.sequence = highest;
        state.mark(StoreKey::PulseSequence);
    }

    let n = merge_missing(&mut state.index, snapshot.index);
    if n > 0 {
        state.mark(StoreKey::Index);
        added += n;
    }

    let n = merge_ledger(&mut state.ledger, snapshot.ledger);
    if n > 0 {
        state.mark(StoreKey::Ledger);
        added += n;
    }

    let n = merge_social(&mut state.social, snapshot.social);
    if n > 0 {
        state.mark(StoreKey::Social);
        added += n;
    }

    let n = merge_missing(&mut state.feeds, snapshot.feeds);
    if n > 0 {
        state.mark(StoreKey::Feeds);
        added += n;
    }

    let n = merge_missing(&mut state.channels, snapshot.channels);
    if n > 0 {
        state.mark(StoreKey::Channels);
        added += n;
    }

    report.added += added;
}

/// Legacy payloads carry only an `entries` map of index entries.
fn merge_legacy(
    state: &mut KernelState,
    entries: &serde_json::Map<String, Value>,
    report: &mut ImportReport,
) {
    let mut added = 0;
    for (address, raw) in entries {
        if let Err(e) = Address::parse(address) {
            report.errors.push(format!("{address}: {e}"));
            continue;
        }
        let entry: AddressIndexEntry = match serde_json::from_value(raw.clone()) {
            Ok(entry) => entry,
            Err(e) => {
                report.errors.push(format!("{address}: {e}"));
                continue;
            }
        };
        if !state.index.contains_key(address) {
            state.index.insert(address.clone(), entry);
            added += 1;
        }
    }
    if added > 0 {
        state.mark(StoreKey::Index);
    }
    report.added += added;
}

fn merge_missing<K: Ord, V>(ours: &mut BTreeMap<K, V>, theirs: BTreeMap<K, V>) -> usize {
    let mut added = 0;
    for (key, value) in theirs {
        if let std::collections::btree_map::Entry::Vacant(slot) = ours.entry(key) {
            slot.insert(value);
            added += 1;
        }
    }
    added
}

/// Add unknown transactions and the balances of unknown dids.
///
/// Imported balances raise the supply by the same amount.
fn merge_ledger(ours: &mut LedgerState, theirs: LedgerState) -> usize {
    let mut added = 0;
    for tx in theirs.transactions {
        if ours.transaction(&tx.id).is_none() {
            ours.transactions.push(tx);
            added += 1;
        }
    }
    for (did, balance) in theirs.balances {
        if ours.has_account(&did) {
            continue;
        }
        let Some(supply) = ours.total_supply.checked_add(balance) else {
            warn!(did = %did, "skipping imported balance that overflows supply");
            continue;
        };
        ours.total_supply = supply;
        ours.balances.insert(did, balance);
        added += 1;
    }
    added
}

/// Union the sets, never following a locally blocked did or blocking a
/// locally followed one.
fn merge_social(ours: &mut SocialGraph, theirs: SocialGraph) -> usize {
    let mut added = 0;
    for did in theirs.following {
        if !ours.blocked.contains(&did) && ours.following.insert(did) {
            added += 1;
        }
    }
    for did in theirs.followers {
        if ours.followers.insert(did) {
            added += 1;
        }
    }
    for did in theirs.blocked {
        if !ours.following.contains(&did) && ours.blocked.insert(did) {
            added += 1;
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "did:xhe:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const B: &str = "did:xhe:bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    #[test]
    fn test_merge_missing_keeps_existing() {
        let mut ours = BTreeMap::from([("a", 1), ("b", 2)]);
        let theirs = BTreeMap::from([("b", 20), ("c", 30)]);
        assert_eq!(merge_missing(&mut ours, theirs), 1);
        assert_eq!(ours, BTreeMap::from([("a", 1), ("b", 2), ("c", 30)]));
    }

    #[test]
    fn test_merge_ledger_conserves_supply() {
        let mut ours = LedgerState::new();
        ours.grant_genesis(A, 100);
        let mut theirs = LedgerState::new();
        theirs.grant_genesis(A, 999);
        theirs.grant_genesis(B, 100);
        theirs.mint(B, 5, "r", now()).unwrap();

        assert_eq!(merge_ledger(&mut ours, theirs), 2);
        assert_eq!(ours.balance(A), 100);
        assert_eq!(ours.balance(B), 105);
        assert_eq!(ours.transactions.len(), 1);
        assert!(ours.is_conserved());
    }

    #[test]
    fn test_merge_social_respects_blocks() {
        let mut ours = SocialGraph::new();
        ours.blocked.insert(B.to_string());
        let mut theirs = SocialGraph::new();
        theirs.following.insert(A.to_string());
        theirs.following.insert(B.to_string());

        assert_eq!(merge_social(&mut ours, theirs), 1);
        assert!(ours.following.contains(A));
        assert!(!ours.following.contains(B));
    }
}
