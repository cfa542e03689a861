//! The Kernel: single-writer authority over identity, content, pulses,
//! ledger and social state.
//!
//! Every entry point takes the state lock for its whole duration, including
//! persistence and notification. One call is one uninterrupted turn:
//! mutate, emit the pulse, commit all touched keys in one batch, then
//! notify observers.

use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use xhe_kernel_core::{now, KernelStats, Pulse, Sequence};
use xhe_kernel_store::{Store, StoreKey};

use crate::config::KernelConfig;
use crate::error::Result;
use crate::events::{EventBus, EventName, KernelEvent, Observer, Subscription};
use crate::state::{KernelMeta, KernelState};

/// The main Kernel struct.
///
/// Owns the durable store and all in-memory state. Construct one per
/// store with [`Kernel::open`]; there is no global instance.
pub struct Kernel<S: Store> {
    pub(crate) store: S,
    pub(crate) config: KernelConfig,
    pub(crate) state: Mutex<KernelState>,
    pub(crate) events: EventBus,
}

impl<S: Store> Kernel<S> {
    /// Open a kernel over `store`, creating first-boot state if needed.
    ///
    /// Storage read failures are logged and replaced by empty stores.
    pub async fn open(store: S, config: KernelConfig) -> Result<Self> {
        let state = KernelState::bootstrap(&store, &config).await?;
        let kernel = Self {
            store,
            events: EventBus::new(config.event_capacity),
            config,
            state: Mutex::new(state),
        };

        {
            let mut state = kernel.state.lock().await;
            kernel.persist(&mut state).await;
            info!(
                did = %state.identity.did,
                boots = state.meta.boots,
                sequence = state.sequence.value(),
                "kernel opened"
            );
        }

        Ok(kernel)
    }

    /// Stamp the last-active time, commit, and close the kernel.
    pub async fn shutdown(self) {
        let mut state = self.state.lock().await;
        state.meta.last_active = now();
        state.mark(StoreKey::Kernel);
        self.persist(&mut state).await;
        info!(sequence = state.sequence.value(), "kernel shut down");
    }

    /// Get the configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Observers
    // ─────────────────────────────────────────────────────────────────────────

    /// Receive every kernel event from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<KernelEvent> {
        self.events.subscribe()
    }

    /// Register a listener for one event name.
    pub fn on(&self, event: EventName, observer: impl Observer + 'static) -> Subscription {
        self.events.on(event, observer)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pulse log
    // ─────────────────────────────────────────────────────────────────────────

    /// All pulses in sequence order.
    pub async fn pulses(&self) -> Vec<Pulse> {
        self.lock().await.ordered_pulses()
    }

    /// Look up a pulse by id (`<sequence>/<hash>`).
    pub async fn pulse(&self, id: &str) -> Option<Pulse> {
        self.lock().await.pulses.get(id).cloned()
    }

    /// The last sequence number handed out.
    pub async fn sequence(&self) -> Sequence {
        self.lock().await.sequence
    }

    /// Reset pulses, oldest first. Kept across resets.
    pub async fn reset_journal(&self) -> Vec<Pulse> {
        self.lock().await.reset_journal.clone()
    }

    pub async fn meta(&self) -> KernelMeta {
        self.lock().await.meta.clone()
    }

    /// Computed counters.
    pub async fn stats(&self) -> KernelStats {
        let state = self.lock().await;
        let did = &state.identity.did;
        KernelStats {
            pulse_count: state.pulses.len(),
            address_count: state.index.len(),
            content_count: state.content.len(),
            balance: state.ledger.balance(did),
            following_count: state.social.following.len(),
            post_count: state
                .feeds
                .get(xhe_kernel_core::social::feed_id_for(did).as_str())
                .map_or(0, |feed| feed.posts.len()),
            channel_count: state.channels.len(),
            sequence: state.sequence.value(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) async fn lock(&self) -> MutexGuard<'_, KernelState> {
        self.state.lock().await
    }

    /// Lock for a mutating call.
    ///
    /// Fails before anything changes when the pulse log cannot take another
    /// sequence, so no mutation is left without its pulse.
    pub(crate) async fn begin(&self) -> Result<MutexGuard<'_, KernelState>> {
        let state = self.state.lock().await;
        state.next_sequence()?;
        Ok(state)
    }

    /// Commit the pending batch, then deliver queued events.
    ///
    /// Commit failures are logged; the marks stay so the next commit retries.
    pub(crate) async fn persist(&self, state: &mut KernelState) {
        match state.pending_batch() {
            Ok(batch) if batch.is_empty() => {}
            Ok(batch) => {
                let ops = batch.len();
                match self.store.commit(batch).await {
                    Ok(()) => {
                        state.clear_pending();
                        debug!(ops, "state committed");
                    }
                    Err(e) => warn!(error = %e, "failed to persist kernel state"),
                }
            }
            Err(e) => warn!(error = %e, "failed to encode kernel state"),
        }

        for event in state.take_outbox() {
            self.events.publish(event);
        }
    }
}
