//! Identity access and regeneration.

use serde_json::json;
use tracing::info;
use xhe_kernel_core::identity::REGENERATE_REASON;
use xhe_kernel_core::{Identity, IdentityHistoryEntry, PulseKind};
use xhe_kernel_store::{Store, StoreKey};

use crate::error::Result;
use crate::events::KernelEvent;
use crate::kernel::Kernel;

impl<S: Store> Kernel<S> {
    /// The current identity.
    pub async fn identity(&self) -> Identity {
        self.lock().await.identity.clone()
    }

    /// Archived identities, oldest first.
    pub async fn identity_history(&self) -> Vec<IdentityHistoryEntry> {
        self.lock().await.history.clone()
    }

    /// Replace the identity with a fresh one, archiving the old.
    ///
    /// The old identity's balance, content and pulses are kept. The
    /// `IDENTITY_REGENERATE` pulse is authored by the outgoing identity.
    pub async fn regenerate_identity(&self) -> Result<Identity> {
        let mut state = self.begin().await?;
        let old = state.identity.clone();
        let new = old.successor();

        state.emit(
            PulseKind::IdentityRegenerate,
            json!({
                "oldDid": old.did,
                "newDid": new.did,
                "version": new.version,
            }),
        )?;

        state
            .history
            .push(IdentityHistoryEntry::archive(old.clone(), REGENERATE_REASON));
        state.identity = new.clone();
        state.mark(StoreKey::IdentityHistory);
        state.mark(StoreKey::Identity);

        state.settle_genesis(self.config.genesis_balance);

        let history = state.history.clone();
        state.notify(KernelEvent::IdentityChanged {
            old_did: old.did.clone(),
            new_did: new.did.clone(),
            history,
        });
        self.persist(&mut state).await;

        info!(old = %old.did, new = %new.did, version = new.version, "identity regenerated");
        Ok(new)
    }
}
