//! Registration lifecycle listeners

use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::error;

use crate::models::{EndpointRecord, RegistrationUpdate};

/// Observer of registry mutations.
///
/// Callbacks run synchronously on the thread performing the mutation, while
/// that endpoint is locked. A slow listener delays the triggering call.
pub trait RegistryListener: Send + Sync {
    fn registered(&self, record: &EndpointRecord);

    fn updated(&self, update: &RegistrationUpdate, record: &EndpointRecord);

    fn unregistered(&self, record: &EndpointRecord);
}

/// Identifies a listener for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listeners = Arc<Vec<(ListenerId, Arc<dyn RegistryListener>)>>;

/// Copy-on-write listener list.
///
/// Fan-out iterates a snapshot, so adding or removing listeners never
/// disturbs a notification in progress.
pub struct ListenerSet {
    listeners: RwLock<Listeners>,
    next_id: AtomicU64,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Arc::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn add(&self, listener: Arc<dyn RegistryListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.write();
        let mut next = Vec::with_capacity(listeners.len() + 1);
        next.extend(listeners.iter().cloned());
        next.push((id, listener));
        *listeners = Arc::new(next);
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        if !listeners.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        let next = listeners
            .iter()
            .filter(|(existing, _)| *existing != id)
            .cloned()
            .collect();
        *listeners = Arc::new(next);
        true
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    pub fn notify_registered(&self, record: &EndpointRecord) {
        self.each("registered", |listener| listener.registered(record));
    }

    pub fn notify_updated(&self, update: &RegistrationUpdate, record: &EndpointRecord) {
        self.each("updated", |listener| listener.updated(update, record));
    }

    pub fn notify_unregistered(&self, record: &EndpointRecord) {
        self.each("unregistered", |listener| listener.unregistered(record));
    }

    /// Invoke `f` on every listener in registration order; a panicking
    /// listener is logged and skipped.
    fn each<F>(&self, event: &str, f: F)
    where
        F: Fn(&dyn RegistryListener),
    {
        let snapshot: Listeners = self.listeners.read().clone();
        for (id, listener) in snapshot.iter() {
            if catch_unwind(AssertUnwindSafe(|| f(listener.as_ref()))).is_err() {
                error!("Listener {:?} panicked while handling {} event", id, event);
            }
        }
    }
}

impl Default for ListenerSet {
    fn default() -> Self {
        Self::new()
    }
}
