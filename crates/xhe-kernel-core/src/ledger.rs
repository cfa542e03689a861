//! Slip ledger: balances plus an append-only transaction log.
//!
//! Invariants maintained by every transition:
//! - the sum of all balances equals `total_supply`
//! - supply grows only through genesis grants and mints
//! - a failed transition leaves the ledger untouched

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::Address;
use crate::crypto::random_hex;
use crate::error::LedgerError;

/// Balance granted to a newly created identity.
pub const GENESIS_BALANCE: u64 = 100;

/// Transaction discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Mint,
    Transfer,
}

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: String,
    pub amount: u64,
    pub memo: String,
    pub timestamp: DateTime<Utc>,
    pub address: String,
}

impl Transaction {
    fn new(
        kind: TransactionKind,
        from: Option<String>,
        to: &str,
        amount: u64,
        memo: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let id = random_hex(16);
        let address = Address::Slip { id: id.clone() }.to_string();
        Self {
            id,
            kind,
            from,
            to: to.to_string(),
            amount,
            memo: memo.to_string(),
            timestamp,
            address,
        }
    }
}

/// Balances and transaction log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    pub balances: BTreeMap<String, u64>,
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub total_supply: u64,
}

impl LedgerState {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of a did (zero when unknown).
    pub fn balance(&self, did: &str) -> u64 {
        self.balances.get(did).copied().unwrap_or(0)
    }

    /// Whether the did has a balance entry at all.
    pub fn has_account(&self, did: &str) -> bool {
        self.balances.contains_key(did)
    }

    /// Grant the genesis balance if the did has no entry yet.
    ///
    /// Returns whether a grant happened.
    pub fn grant_genesis(&mut self, did: &str, amount: u64) -> bool {
        if self.has_account(did) {
            return false;
        }
        let Some(supply) = self.total_supply.checked_add(amount) else {
            return false;
        };
        self.balances.insert(did.to_string(), amount);
        self.total_supply = supply;
        true
    }

    /// Credit `to` with newly created slips.
    pub fn mint(
        &mut self,
        to: &str,
        amount: u64,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::NonPositiveAmount);
        }
        let balance = self
            .balance(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        let tx = Transaction::new(TransactionKind::Mint, None, to, amount, reason, now);
        self.balances.insert(to.to_string(), balance);
        self.total_supply = supply;
        self.transactions.push(tx.clone());
        Ok(tx)
    }

    /// Move slips from `from` to `to`.
    ///
    /// Both new balances are computed before either is written.
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: u64,
        memo: &str,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::NonPositiveAmount);
        }
        let available = self.balance(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        let tx = Transaction::new(
            TransactionKind::Transfer,
            Some(from.to_string()),
            to,
            amount,
            memo,
            now,
        );

        if from != to {
            let debited = available - amount;
            let credited = self
                .balance(to)
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?;
            self.balances.insert(from.to_string(), debited);
            self.balances.insert(to.to_string(), credited);
        }
        self.transactions.push(tx.clone());
        Ok(tx)
    }

    /// Look up a transaction by id.
    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    /// Whether balances sum to the recorded supply.
    pub fn is_conserved(&self) -> bool {
        let sum: Option<u64> = self
            .balances
            .values()
            .try_fold(0u64, |acc, b| acc.checked_add(*b));
        sum == Some(self.total_supply)
    }
}
