//! In-memory kernel state and its durable layout.
//!
//! Every mutation marks the keys it touched. [`KernelState::pending_batch`]
//! turns the marks into one [`WriteBatch`]; marks are cleared only after the
//! batch commits, so a failed commit is retried by the next operation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use xhe_kernel_core::{
    now, AddressIndexEntry, Channel, ContentEntry, ContentHash, CoreError, Feed, Identity,
    IdentityHistoryEntry, LedgerState, Pulse, PulseBuilder, PulseKind, Sequence, SocialGraph,
};
use xhe_kernel_store::{Store, StoreError, StoreExt, StoreKey, WriteBatch};

use crate::config::KernelConfig;
use crate::error::Result;
use crate::events::KernelEvent;

/// Kernel lifecycle metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KernelMeta {
    pub created: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub kernel_version: String,
    /// Number of times the kernel has been opened.
    pub boots: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reset: Option<DateTime<Utc>>,
    /// Dids whose genesis grant has been made, or waived by a reset.
    /// A did is never granted twice.
    #[serde(default)]
    pub genesis_settled: BTreeSet<String>,
}

impl KernelMeta {
    fn new(created: DateTime<Utc>, kernel_version: &str) -> Self {
        Self {
            created,
            last_active: created,
            kernel_version: kernel_version.to_string(),
            boots: 0,
            last_reset: None,
            genesis_settled: BTreeSet::new(),
        }
    }
}

pub(crate) struct KernelState {
    pub meta: KernelMeta,
    pub identity: Identity,
    pub history: Vec<IdentityHistoryEntry>,
    pub content: BTreeMap<ContentHash, ContentEntry>,
    /// Keyed by pulse id (`<sequence>/<hash>`).
    pub pulses: BTreeMap<String, Pulse>,
    /// Last sequence handed out; never decreases.
    pub sequence: Sequence,
    pub index: BTreeMap<String, AddressIndexEntry>,
    pub ledger: LedgerState,
    pub social: SocialGraph,
    pub feeds: BTreeMap<String, Feed>,
    pub channels: BTreeMap<String, Channel>,
    pub reset_journal: Vec<Pulse>,
    kernel_version: String,
    dirty: BTreeSet<StoreKey>,
    deleted: BTreeSet<StoreKey>,
    outbox: Vec<KernelEvent>,
}

impl KernelState {
    /// Load every store, creating what is missing.
    pub(crate) async fn bootstrap<S: Store>(store: &S, config: &KernelConfig) -> Result<Self> {
        let started = now();

        let stored_meta: Option<KernelMeta> = load_logged(store, StoreKey::Kernel).await;
        let fresh = stored_meta.is_none();
        let mut meta =
            stored_meta.unwrap_or_else(|| KernelMeta::new(started, &config.kernel_version));
        meta.last_active = started;
        meta.boots += 1;
        meta.kernel_version = config.kernel_version.clone();

        let stored_sequence: Option<u64> = load_logged(store, StoreKey::PulseSequence).await;
        let stored_identity: Option<Identity> = load_logged(store, StoreKey::Identity).await;

        let mut state = Self {
            meta,
            identity: stored_identity
                .clone()
                .unwrap_or_else(|| Identity::generate(1)),
            history: store.load_or_default(StoreKey::IdentityHistory).await,
            content: store.load_or_default(StoreKey::Content).await,
            pulses: store.load_or_default(StoreKey::Pulses).await,
            sequence: Sequence::new(stored_sequence.unwrap_or(0)),
            index: store.load_or_default(StoreKey::Index).await,
            ledger: store.load_or_default(StoreKey::Ledger).await,
            social: store.load_or_default(StoreKey::Social).await,
            feeds: store.load_or_default(StoreKey::Feeds).await,
            channels: store.load_or_default(StoreKey::Channels).await,
            reset_journal: store.load_or_default(StoreKey::ResetJournal).await,
            kernel_version: config.kernel_version.clone(),
            dirty: BTreeSet::new(),
            deleted: BTreeSet::new(),
            outbox: Vec::new(),
        };

        state.mark(StoreKey::Kernel);
        if stored_sequence.is_none() {
            state.mark(StoreKey::PulseSequence);
        }
        if stored_identity.is_none() {
            info!(did = %state.identity.did, "created identity");
            state.mark(StoreKey::Identity);
        }

        let highest = state
            .pulses
            .values()
            .chain(state.reset_journal.iter())
            .map(|p| p.sequence)
            .max()
            .unwrap_or(Sequence::ZERO);
        if highest > state.sequence {
            warn!(
                counter = state.sequence.value(),
                highest = highest.value(),
                "sequence counter behind pulse log, advancing"
            );
            state.sequence = highest;
            state.mark(StoreKey::PulseSequence);
        }

        state.settle_genesis(config.genesis_balance);

        let did = state.identity.did.clone();
        if fresh {
            let payload = json!({
                "did": did,
                "publicKey": state.identity.public_key,
                "kernelVersion": config.kernel_version,
            });
            state.emit(PulseKind::KernelInit, payload)?;
        }

        Ok(state)
    }

    /// Mark a key for the next commit.
    pub(crate) fn mark(&mut self, key: StoreKey) {
        self.dirty.insert(key);
    }

    /// Mark a key for deletion at the next commit.
    pub(crate) fn wipe(&mut self, key: StoreKey) {
        self.dirty.remove(&key);
        self.deleted.insert(key);
    }

    /// Grant genesis to the current identity unless its grant is settled.
    ///
    /// Returns whether slips were granted.
    pub(crate) fn settle_genesis(&mut self, amount: u64) -> bool {
        let did = self.identity.did.clone();
        if !self.meta.genesis_settled.insert(did.clone()) {
            return false;
        }
        self.mark(StoreKey::Kernel);

        let granted = self.ledger.grant_genesis(&did, amount);
        if granted {
            debug!(did = %did, amount, "genesis balance granted");
            self.mark(StoreKey::Ledger);
        }
        granted
    }

    /// The sequence the next pulse will carry.
    pub(crate) fn next_sequence(&self) -> std::result::Result<Sequence, CoreError> {
        self.sequence.next()
    }

    /// Append a pulse for the current operation.
    pub(crate) fn emit(
        &mut self,
        kind: PulseKind,
        payload: Value,
    ) -> std::result::Result<Pulse, CoreError> {
        let sequence = self.next_sequence()?;
        let pulse = PulseBuilder::new(kind, sequence)
            .payload(payload)
            .timestamp(now())
            .author(self.identity.did.clone())
            .kernel_version(self.kernel_version.clone())
            .seal()?;

        self.sequence = sequence;
        self.pulses.insert(pulse.id.clone(), pulse.clone());
        self.mark(StoreKey::Pulses);
        self.mark(StoreKey::PulseSequence);
        self.outbox.push(KernelEvent::NewPulse(pulse.clone()));

        debug!(kind = kind.as_str(), id = %pulse.id, "pulse emitted");
        Ok(pulse)
    }

    /// Queue an event for delivery after the commit.
    pub(crate) fn notify(&mut self, event: KernelEvent) {
        self.outbox.push(event);
    }

    pub(crate) fn take_outbox(&mut self) -> Vec<KernelEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Encode every marked key into one batch. Deletes apply before puts.
    pub(crate) fn pending_batch(&self) -> std::result::Result<WriteBatch, StoreError> {
        let mut batch = WriteBatch::new();
        for key in &self.deleted {
            batch.delete(key.as_str());
        }
        for &key in &self.dirty {
            match key {
                StoreKey::Kernel => batch.put_value(key, &self.meta)?,
                StoreKey::Identity => batch.put_value(key, &self.identity)?,
                StoreKey::IdentityHistory => batch.put_value(key, &self.history)?,
                StoreKey::Content => batch.put_value(key, &self.content)?,
                StoreKey::Pulses => batch.put_value(key, &self.pulses)?,
                StoreKey::PulseSequence => batch.put_value(key, &self.sequence.value())?,
                StoreKey::Index => batch.put_value(key, &self.index)?,
                StoreKey::Ledger => batch.put_value(key, &self.ledger)?,
                StoreKey::Social => batch.put_value(key, &self.social)?,
                StoreKey::Feeds => batch.put_value(key, &self.feeds)?,
                StoreKey::Channels => batch.put_value(key, &self.channels)?,
                StoreKey::ResetJournal => batch.put_value(key, &self.reset_journal)?,
            };
        }
        Ok(batch)
    }

    /// Forget the marks after a successful commit.
    pub(crate) fn clear_pending(&mut self) {
        self.dirty.clear();
        self.deleted.clear();
    }

    /// Pulses in sequence order.
    pub(crate) fn ordered_pulses(&self) -> Vec<Pulse> {
        let mut pulses: Vec<Pulse> = self.pulses.values().cloned().collect();
        pulses.sort_by_key(|p| p.sequence);
        pulses
    }
}

/// Load a key, treating read failures as absence.
async fn load_logged<S: Store, T: DeserializeOwned + Send>(store: &S, key: StoreKey) -> Option<T> {
    match store.load(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!(key = %key, error = %e, "failed to load store, using default");
            None
        }
    }
}
