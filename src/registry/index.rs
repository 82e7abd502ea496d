//! Endpoint indexes and per-endpoint serialization

use parking_lot::{ArcMutexGuard, Mutex, RawMutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

use crate::device::EndpointDevice;
use crate::directory::DirectoryHandle;
use crate::models::EndpointRecord;

/// One active registration
#[derive(Debug, Clone)]
pub(crate) struct IndexEntry {
    pub device: EndpointDevice,
    pub handle: Option<DirectoryHandle>,
}

impl IndexEntry {
    pub fn record(&self) -> &EndpointRecord {
        self.device.record()
    }
}

#[derive(Default)]
struct Maps {
    by_name: HashMap<String, IndexEntry>,
    /// registration id -> endpoint name
    by_id: HashMap<String, String>,
}

/// The two endpoint indexes, always edited together.
///
/// The inner lock is held only for the map edit itself; callers serialize
/// check-then-act sequences per endpoint with [`KeyLocks`].
#[derive(Default)]
pub(crate) struct EndpointIndex {
    maps: RwLock<Maps>,
}

impl EndpointIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, endpoint_name: &str) -> Option<IndexEntry> {
        self.maps.read().by_name.get(endpoint_name).cloned()
    }

    pub fn name_for_id(&self, registration_id: &str) -> Option<String> {
        self.maps.read().by_id.get(registration_id).cloned()
    }

    /// Install `entry` for its endpoint, returning the entry it displaced.
    ///
    /// Fails with the owning endpoint name when the registration id is
    /// already held by a different endpoint; nothing is changed then.
    pub fn try_insert(&self, entry: IndexEntry) -> Result<Option<IndexEntry>, String> {
        let name = entry.record().endpoint_name.clone();
        let id = entry.record().registration_id.clone();

        let mut maps = self.maps.write();
        if let Some(owner) = maps.by_id.get(&id).filter(|owner| **owner != name) {
            return Err(owner.clone());
        }

        let previous = maps.by_name.insert(name.clone(), entry);
        if let Some(previous) = &previous {
            maps.by_id.remove(&previous.record().registration_id);
        }
        maps.by_id.insert(id, name);
        Ok(previous)
    }

    pub fn set_handle(&self, endpoint_name: &str, handle: Option<DirectoryHandle>) {
        if let Some(entry) = self.maps.write().by_name.get_mut(endpoint_name) {
            entry.handle = handle;
        }
    }

    /// Replace the entry for an endpoint whose registration id is unchanged
    pub fn replace(&self, entry: IndexEntry) {
        let mut maps = self.maps.write();
        maps.by_name
            .insert(entry.record().endpoint_name.clone(), entry);
    }

    pub fn remove(&self, endpoint_name: &str) -> Option<IndexEntry> {
        let mut maps = self.maps.write();
        let removed = maps.by_name.remove(endpoint_name)?;
        maps.by_id.remove(&removed.record().registration_id);
        Some(removed)
    }

    /// Point-in-time copy of all active records
    pub fn records(&self) -> Vec<EndpointRecord> {
        self.maps
            .read()
            .by_name
            .values()
            .map(|entry| entry.record().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.maps.read().by_name.len()
    }

    #[cfg(test)]
    pub fn id_count(&self) -> usize {
        self.maps.read().by_id.len()
    }
}

/// Table of per-endpoint mutexes.
///
/// Operations on the same endpoint name run one at a time; different names
/// never contend beyond the brief table lookup. A key's mutex is dropped
/// from the table once its last holder releases it.
#[derive(Default)]
pub(crate) struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self, key: &str) -> KeyGuard<'_> {
        let slot = {
            let mut locks = self.locks.lock();
            Arc::clone(
                locks
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        let guard = slot.lock_arc();
        KeyGuard {
            owner: self,
            key: key.to_string(),
            slot: Some(slot),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Held while an endpoint's check-then-act sequence runs
pub(crate) struct KeyGuard<'a> {
    owner: &'a KeyLocks,
    key: String,
    slot: Option<Arc<Mutex<()>>>,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        // The table and this guard hold the only references when no one else
        // is waiting; new waiters must go through the table lock first. The
        // slot is released under the table lock so the last holder out always
        // sees a count of 2.
        let mut locks = self.owner.locks.lock();
        if let Some(slot) = self.slot.take() {
            if Arc::strong_count(&slot) == 2 {
                locks.remove(&self.key);
            }
            drop(slot);
        }
    }
}
