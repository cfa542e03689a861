//! Address resolution.
//!
//! Parsing happens first; a malformed address yields `INVALID` and leaves
//! no trace. Any well-formed address is audited with one `ADDRESS_RESOLVE`
//! pulse before dispatch, whatever the outcome.

use serde_json::json;
use tracing::{debug, warn};
use xhe_kernel_core::pulse::pulse_id;
use xhe_kernel_core::{
    Address, ContentHash, IdentityProfile, PulseKind, Resolution, Resolved, Scheme, TruthState,
};
use xhe_kernel_store::Store;

use crate::kernel::Kernel;
use crate::state::KernelState;

impl<S: Store> Kernel<S> {
    /// Resolve an address. Never fails; problems are reported in the result.
    pub async fn resolve(&self, input: &str) -> Resolution {
        let address = match Address::parse(input) {
            Ok(address) => address,
            Err(e) => {
                debug!(address = input, error = %e, "address rejected");
                return Resolution::invalid(input, e.to_string());
            }
        };

        let mut state = self.lock().await;
        let audit = match state.emit(PulseKind::AddressResolve, json!({ "address": input })) {
            Ok(pulse) => Some(pulse.id),
            Err(e) => {
                warn!(address = input, error = %e, "failed to audit resolution");
                None
            }
        };

        let mut resolution = resolve_in(&state, input, &address);
        resolution.audit_pulse = audit;
        self.persist(&mut state).await;

        debug!(address = input, state = ?resolution.state, "address resolved");
        resolution
    }
}

/// Resolve against a state snapshot without side effects.
pub(crate) fn resolve_in(state: &KernelState, input: &str, address: &Address) -> Resolution {
    let scheme = address.scheme();
    match address {
        Address::Content { hash } | Address::External { hash } => {
            resolve_content(state, input, scheme, hash)
        }
        Address::Identity { .. } => resolve_identity(state, input),
        Address::Pulse { sequence, hash } => {
            let found = match sequence {
                Some(seq) => state.pulses.get(&pulse_id(*seq, hash)),
                None => state.pulses.values().find(|p| &p.hash == hash),
            };
            match found {
                Some(pulse) => Resolution::new(TruthState::Resolved, input, scheme)
                    .with_content(Resolved::Pulse(pulse.clone())),
                None => index_fallback(state, input, scheme),
            }
        }
        Address::Slip { id } => match state.ledger.transaction(id) {
            Some(tx) => Resolution::new(TruthState::Resolved, input, scheme)
                .with_content(Resolved::Transaction(tx.clone())),
            None => Resolution::new(TruthState::Unknown, input, scheme),
        },
        Address::Feed { id } => match state.feeds.get(id) {
            Some(feed) => Resolution::new(TruthState::Resolved, input, scheme)
                .with_content(Resolved::Feed(feed.clone())),
            None => Resolution::new(TruthState::Unknown, input, scheme),
        },
        Address::Channel { id } => match state.channels.get(id) {
            Some(channel) => Resolution::new(TruthState::Resolved, input, scheme)
                .with_content(Resolved::Channel(channel.clone())),
            None => Resolution::new(TruthState::Unknown, input, scheme),
        },
    }
}

fn resolve_content(state: &KernelState, input: &str, scheme: Scheme, hash: &str) -> Resolution {
    let entry = ContentHash::from_hex(hash)
        .ok()
        .and_then(|h| state.content.get(&h));

    match entry {
        Some(entry) => {
            let mut resolution = Resolution::new(TruthState::Resolved, input, scheme)
                .with_content(Resolved::Content(entry.clone()));
            resolution.metadata.index_entry = state.index.get(input).cloned();
            resolution
        }
        None => index_fallback(state, input, scheme),
    }
}

fn resolve_identity(state: &KernelState, did: &str) -> Resolution {
    let scheme = Scheme::Identity;

    if state.identity.did == did {
        let balance = state.ledger.balance(did);
        let mut resolution = Resolution::new(TruthState::Resolved, did, scheme)
            .with_content(Resolved::Identity(IdentityProfile::new(&state.identity, balance)));
        resolution.metadata.balance = Some(balance);
        return resolution;
    }

    if let Some(entry) = state.history.iter().find(|e| e.identity.did == did) {
        let mut resolution = Resolution::new(TruthState::KnownButUnavailable, did, scheme);
        resolution.metadata.archived = Some(entry.clone());
        resolution.metadata.balance = Some(state.ledger.balance(did));
        return resolution;
    }

    if let Some(relation) = state.social.relation(did) {
        let mut resolution = Resolution::new(TruthState::KnownButUnavailable, did, scheme);
        resolution.metadata.relation = Some(relation);
        return resolution;
    }

    index_fallback(state, did, scheme)
}

/// `KNOWN_BUT_UNAVAILABLE` when only the index knows the address.
fn index_fallback(state: &KernelState, input: &str, scheme: Scheme) -> Resolution {
    match state.index.get(input) {
        Some(entry) => {
            let mut resolution = Resolution::new(TruthState::KnownButUnavailable, input, scheme);
            resolution.metadata.index_entry = Some(entry.clone());
            resolution
        }
        None => Resolution::new(TruthState::Unknown, input, scheme),
    }
}
