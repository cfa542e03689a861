//! Address generation and the address index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use xhe_kernel_core::{
    now, preview, validate_content, Address, AddressIndexEntry, ContentEntry, ContentHash,
    IndexedAddress, PulseKind, Scheme, Sequence,
};
use xhe_kernel_store::{Store, StoreKey};

use crate::error::{KernelError, Result};
use crate::events::KernelEvent;
use crate::kernel::Kernel;

/// Options for [`Kernel::generate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Sequence for `pulse` addresses; defaults to the sequence of the
    /// generate call's own pulse.
    pub sequence: Option<Sequence>,
}

impl GenerateOptions {
    pub fn with_sequence(sequence: Sequence) -> Self {
        Self {
            sequence: Some(sequence),
        }
    }
}

/// Result of address generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generated {
    pub address: String,
    pub hash: ContentHash,
    pub timestamp: DateTime<Utc>,
    pub pulse_id: String,
}

impl<S: Store> Kernel<S> {
    /// Derive the address of `content` under `scheme`, store the content,
    /// index the address, and emit `ADDRESS_GENERATE`.
    ///
    /// Supported schemes: `xhe`, `did:xhe`, `pulse`, `ipfs`.
    pub async fn generate(
        &self,
        content: &str,
        scheme: &str,
        options: GenerateOptions,
    ) -> Result<Generated> {
        validate_content(content)?;
        let scheme: Scheme = scheme
            .parse()
            .ok()
            .filter(|s: &Scheme| s.is_generatable())
            .ok_or_else(|| KernelError::UnknownScheme(scheme.to_string()))?;

        let hash = ContentHash::of_str(content);
        let mut state = self.begin().await?;
        let timestamp = now();

        let address = match scheme {
            Scheme::Content => Address::content(&hash),
            Scheme::Identity => Address::identity_from_hash(&hash),
            Scheme::External => Address::external(&hash),
            Scheme::Pulse => {
                let sequence = match options.sequence {
                    Some(sequence) => sequence,
                    None => state.next_sequence()?,
                };
                Address::pulse(sequence, hash.to_hex())
            }
            other => return Err(KernelError::UnknownScheme(other.as_str().to_string())),
        }
        .to_string();

        let author = state.identity.did.clone();
        state.content.insert(
            hash,
            ContentEntry {
                content: content.to_string(),
                timestamp,
                author,
                scheme,
            },
        );
        state.index.insert(
            address.clone(),
            AddressIndexEntry {
                hash,
                scheme,
                timestamp,
                preview: preview(content, self.config.preview_len),
            },
        );
        state.mark(StoreKey::Content);
        state.mark(StoreKey::Index);

        let pulse = state.emit(
            PulseKind::AddressGenerate,
            json!({
                "address": address,
                "hash": hash.to_hex(),
                "type": scheme.as_str(),
            }),
        )?;
        self.persist(&mut state).await;

        Ok(Generated {
            address,
            hash,
            timestamp,
            pulse_id: pulse.id,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Address index
    // ─────────────────────────────────────────────────────────────────────────

    /// Get one index entry.
    pub async fn index_entry(&self, address: &str) -> Option<AddressIndexEntry> {
        self.lock().await.index.get(address).cloned()
    }

    /// List index entries, most recent first, optionally of one scheme.
    pub async fn list_index(&self, scheme: Option<Scheme>) -> Vec<IndexedAddress> {
        let state = self.lock().await;
        let mut entries: Vec<IndexedAddress> = state
            .index
            .iter()
            .filter(|(_, entry)| scheme.map_or(true, |s| entry.scheme == s))
            .map(|(address, entry)| IndexedAddress {
                address: address.clone(),
                entry: entry.clone(),
            })
            .collect();
        entries.sort_by(|a, b| b.entry.timestamp.cmp(&a.entry.timestamp));
        entries
    }

    /// Empty the address index. The content store is untouched.
    ///
    /// Returns the number of entries removed.
    pub async fn clear_index(&self) -> Result<usize> {
        let mut state = self.begin().await?;
        let cleared = state.index.len();
        state.index.clear();
        state.mark(StoreKey::Index);

        state.emit(PulseKind::IndexClear, json!({ "cleared": cleared }))?;
        state.notify(KernelEvent::IndexCleared { cleared });
        self.persist(&mut state).await;

        info!(cleared, "address index cleared");
        Ok(cleared)
    }
}
