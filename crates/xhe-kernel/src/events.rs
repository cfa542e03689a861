//! Observer channel.
//!
//! Events reach subscribers two ways: a typed `tokio::sync::broadcast`
//! receiver carrying every event, and listeners registered per event name.
//! A listener that errors or panics is logged and skipped; the remaining
//! listeners still run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;
use xhe_kernel_core::{IdentityHistoryEntry, Pulse};

/// Event names listeners subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    NewPulse,
    IdentityChanged,
    IndexCleared,
    KernelReset,
}

impl EventName {
    pub fn as_str(self) -> &'static str {
        match self {
            EventName::NewPulse => "new-pulse",
            EventName::IdentityChanged => "identity-changed",
            EventName::IndexCleared => "index-cleared",
            EventName::KernelReset => "kernel-reset",
        }
    }
}

/// A kernel notification.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelEvent {
    /// A pulse was appended.
    NewPulse(Pulse),
    /// The identity was regenerated.
    IdentityChanged {
        old_did: String,
        new_did: String,
        history: Vec<IdentityHistoryEntry>,
    },
    /// The address index was emptied.
    IndexCleared { cleared: usize },
    /// The kernel was reset.
    KernelReset { preserve_identity: bool },
}

impl KernelEvent {
    pub fn name(&self) -> EventName {
        match self {
            KernelEvent::NewPulse(_) => EventName::NewPulse,
            KernelEvent::IdentityChanged { .. } => EventName::IdentityChanged,
            KernelEvent::IndexCleared { .. } => EventName::IndexCleared,
            KernelEvent::KernelReset { .. } => EventName::KernelReset,
        }
    }
}

/// Failure reported by a listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("observer failed: {0}")]
pub struct ObserverError(pub String);

/// A per-event listener.
pub trait Observer: Send + Sync {
    fn notify(&self, event: &KernelEvent) -> Result<(), ObserverError>;
}

impl<F> Observer for F
where
    F: Fn(&KernelEvent) -> Result<(), ObserverError> + Send + Sync,
{
    fn notify(&self, event: &KernelEvent) -> Result<(), ObserverError> {
        self(event)
    }
}

struct Listener {
    id: u64,
    name: EventName,
    observer: Arc<dyn Observer>,
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<Listener>>,
}

impl Registry {
    fn remove(&self, id: u64) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }
}

/// Handle to a registered listener.
///
/// Dropping the handle leaves the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    name: EventName,
    registry: Weak<Registry>,
}

impl Subscription {
    /// The event this subscription listens to.
    pub fn event(&self) -> EventName {
        self.name
    }

    /// Remove the listener. Returns whether it was still registered.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(self.id),
            None => false,
        }
    }
}

/// Fan-out of kernel events.
pub struct EventBus {
    sender: broadcast::Sender<KernelEvent>,
    registry: Arc<Registry>,
}

impl EventBus {
    /// Create a bus whose broadcast channel buffers `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            registry: Arc::new(Registry::default()),
        }
    }

    /// Receive every event from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<KernelEvent> {
        self.sender.subscribe()
    }

    /// Register a listener for one event name.
    pub fn on(&self, name: EventName, observer: impl Observer + 'static) -> Subscription {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Listener {
                id,
                name,
                observer: Arc::new(observer),
            });
        Subscription {
            id,
            name,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Number of listeners registered for `name`.
    pub fn listener_count(&self, name: EventName) -> usize {
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|l| l.name == name)
            .count()
    }

    /// Deliver an event to the broadcast channel and matching listeners.
    pub fn publish(&self, event: KernelEvent) {
        let name = event.name();

        // Listeners run outside the registry lock so they may unsubscribe.
        let targets: Vec<Arc<dyn Observer>> = self
            .registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|l| l.name == name)
            .map(|l| Arc::clone(&l.observer))
            .collect();

        for observer in targets {
            match catch_unwind(AssertUnwindSafe(|| observer.notify(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(event = name.as_str(), error = %e, "listener failed"),
                Err(_) => warn!(event = name.as_str(), "listener panicked"),
            }
        }

        // No receivers is not an error.
        let _ = self.sender.send(event);
    }
}
