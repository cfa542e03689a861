//! Slip ledger operations.

use serde_json::json;
use tracing::debug;
use xhe_kernel_core::{now, validate_amount, validate_did, PulseKind, Transaction};
use xhe_kernel_store::{Store, StoreKey};

use crate::error::Result;
use crate::kernel::Kernel;

impl<S: Store> Kernel<S> {
    /// Balance of the current identity.
    pub async fn balance(&self) -> u64 {
        let state = self.lock().await;
        state.ledger.balance(&state.identity.did)
    }

    /// Balance of any did (zero when unknown).
    pub async fn balance_of(&self, did: &str) -> u64 {
        self.lock().await.ledger.balance(did)
    }

    /// All transactions, oldest first.
    pub async fn transactions(&self) -> Vec<Transaction> {
        self.lock().await.ledger.transactions.clone()
    }

    /// Sum of genesis grants and mints.
    pub async fn total_supply(&self) -> u64 {
        self.lock().await.ledger.total_supply
    }

    /// Credit the current identity with new slips.
    pub async fn mint(&self, amount: u64, reason: &str) -> Result<Transaction> {
        validate_amount(amount)?;

        let mut state = self.begin().await?;
        let did = state.identity.did.clone();
        let tx = state.ledger.mint(&did, amount, reason, now())?;
        state.mark(StoreKey::Ledger);

        state.emit(
            PulseKind::SlipMint,
            json!({
                "txId": tx.id,
                "to": did,
                "amount": amount,
                "reason": reason,
            }),
        )?;
        self.persist(&mut state).await;

        debug!(tx = %tx.id, amount, "minted");
        Ok(tx)
    }

    /// Move slips from the current identity to `to`.
    ///
    /// On insufficient balance nothing changes and no pulse is emitted.
    pub async fn transfer(&self, to: &str, amount: u64, memo: &str) -> Result<Transaction> {
        validate_amount(amount)?;
        validate_did(to)?;

        let mut state = self.begin().await?;
        let from = state.identity.did.clone();
        let tx = state.ledger.transfer(&from, to, amount, memo, now())?;
        state.mark(StoreKey::Ledger);

        state.emit(
            PulseKind::SlipTransfer,
            json!({
                "txId": tx.id,
                "from": from,
                "to": to,
                "amount": amount,
                "memo": memo,
            }),
        )?;
        self.persist(&mut state).await;

        debug!(tx = %tx.id, amount, to, "transferred");
        Ok(tx)
    }
}
