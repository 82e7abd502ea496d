//! Registration registry
//!
//! Owns the set of active endpoint registrations. Every mutation runs under
//! the endpoint's key lock: the index edit, the directory publication, and
//! the listener fan-out all happen before the lock is released, so
//! notifications for one endpoint are never interleaved.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use super::index::{EndpointIndex, IndexEntry, KeyLocks};
use super::{Clock, ListenerId, ListenerSet, RegistryListener, SystemClock};
use crate::device::{EndpointDevice, RequestSender, UnreachableSender, DEFAULT_RESPONSE_TIMEOUT};
use crate::directory::{Directory, DirectoryHandle, NullDirectory};
use crate::metrics;
use crate::models::{EndpointRecord, RegistrationUpdate, RegistryError, RegistryResult};

/// Registry of currently registered endpoints
pub struct Registry {
    index: EndpointIndex,
    locks: KeyLocks,
    listeners: ListenerSet,
    clock: Arc<dyn Clock>,
    directory: Arc<dyn Directory>,
    sender: Arc<dyn RequestSender>,
    response_timeout: Duration,
}

impl Registry {
    /// Create a registry with the given clock, no directory, and no transport
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            index: EndpointIndex::new(),
            locks: KeyLocks::new(),
            listeners: ListenerSet::new(),
            clock,
            directory: Arc::new(NullDirectory),
            sender: Arc::new(UnreachableSender),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    /// Publish registrations to `directory`
    pub fn with_directory(mut self, directory: Arc<dyn Directory>) -> Self {
        self.directory = directory;
        self
    }

    /// Reach devices through `sender`
    pub fn with_sender(mut self, sender: Arc<dyn RequestSender>) -> Self {
        self.sender = sender;
        self
    }

    /// Response timeout handed to device handles
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Current time according to the registry clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Register an endpoint.
    ///
    /// If the endpoint name already has an active registration it is replaced
    /// and returned as the stale record; listeners see `unregistered(stale)`
    /// followed by `registered(new)`. The lease starts at the registry
    /// clock's current time.
    pub fn register(&self, mut record: EndpointRecord) -> RegistryResult<Option<EndpointRecord>> {
        record.validate()?;

        let endpoint_name = record.endpoint_name.clone();
        let _guard = self.locks.lock(&endpoint_name);

        let now = self.clock.now();
        record.registered_at = now;
        record.last_renewed_at = now;

        let device = EndpointDevice::new(record, Arc::clone(&self.sender))
            .with_response_timeout(self.response_timeout);

        let stale = self
            .index
            .try_insert(IndexEntry {
                device: device.clone(),
                handle: None,
            })
            .map_err(|owner| {
                warn!(
                    "Rejected registration of {}: id {} is already held by {}",
                    endpoint_name,
                    device.record().registration_id,
                    owner
                );
                RegistryError::duplicate_registration_id(&device.record().registration_id, owner)
            })?;

        if let Some(handle) = stale.as_ref().and_then(|entry| entry.handle) {
            self.withdraw(handle, &endpoint_name);
        }

        let handle = self.publish(&device);
        if handle.is_some() {
            self.index.set_handle(&endpoint_name, handle);
        }
        metrics::set_active_endpoints(self.index.len() as i64);

        match stale {
            None => {
                metrics::record_registration();
                info!(
                    "Registered {} (id: {}, address: {}:{}, lifetime: {}s)",
                    endpoint_name,
                    device.record().registration_id,
                    device.record().address,
                    device.record().port,
                    device.record().lifetime_secs
                );
                self.listeners.notify_registered(device.record());
                Ok(None)
            }
            Some(stale) => {
                metrics::record_registration();
                metrics::record_replacement();
                info!(
                    "Re-registered {}: replaced stale id {} with {}",
                    endpoint_name,
                    stale.record().registration_id,
                    device.record().registration_id
                );
                self.listeners.notify_unregistered(stale.record());
                self.listeners.notify_registered(device.record());
                Ok(Some(stale.device.into_record()))
            }
        }
    }

    /// Renew a registration, applying the fields set in `update`.
    ///
    /// An unknown registration id is logged and yields `Ok(None)`.
    pub fn update(&self, update: RegistrationUpdate) -> RegistryResult<Option<EndpointRecord>> {
        let Some(endpoint_name) = self.index.name_for_id(&update.registration_id) else {
            warn!(
                "Update ignored: no endpoint is registered under id {}",
                update.registration_id
            );
            return Ok(None);
        };

        let _guard = self.locks.lock(&endpoint_name);

        let Some(mut entry) = self.active_entry(&endpoint_name, &update.registration_id) else {
            warn!(
                "Update ignored: registration {} of {} is no longer active",
                update.registration_id, endpoint_name
            );
            return Ok(None);
        };

        let now = self.clock.now();
        let renewed = update.apply_to(entry.record(), now);
        entry.device.replace_record(renewed)?;
        self.index.replace(entry.clone());

        if let Some(handle) = entry.handle {
            if let Err(e) = self.directory.republish(handle, entry.device.metadata(now)) {
                warn!("Failed to republish {} for {}: {}", handle, endpoint_name, e);
            }
        }

        metrics::record_update();
        debug!(
            "Updated {} (id: {}), lease now expires at {}",
            endpoint_name,
            update.registration_id,
            entry.record().expires_at()
        );
        self.listeners.notify_updated(&update, entry.record());

        Ok(Some(entry.device.into_record()))
    }

    /// Remove a registration.
    ///
    /// An unknown registration id is logged and yields `None`.
    pub fn deregister(&self, registration_id: &str) -> Option<EndpointRecord> {
        match self.remove_if(registration_id, |_| true) {
            Some(record) => {
                metrics::record_deregistration();
                info!(
                    "Deregistered {} (id: {})",
                    record.endpoint_name, record.registration_id
                );
                Some(record)
            }
            None => {
                warn!(
                    "Deregistration ignored: no endpoint is registered under id {}",
                    registration_id
                );
                None
            }
        }
    }

    /// Evict every registration whose lease has run out at `now`.
    ///
    /// Works on a snapshot; expiry is re-checked against the same `now` under
    /// each endpoint's lock, so a registration renewed or replaced after the
    /// snapshot is left alone.
    pub fn sweep(&self, now: DateTime<Utc>) -> Vec<EndpointRecord> {
        let mut evicted = Vec::new();

        for record in self.snapshot() {
            if !record.is_expired_at(now) {
                trace!("{} (id: {}) alive", record.endpoint_name, record.registration_id);
                continue;
            }

            match self.remove_if(&record.registration_id, |current| current.is_expired_at(now)) {
                Some(removed) => {
                    metrics::record_eviction();
                    info!(
                        "Evicted {} (id: {}): lease expired at {}",
                        removed.endpoint_name,
                        removed.registration_id,
                        removed.expires_at()
                    );
                    evicted.push(removed);
                }
                None => trace!(
                    "{} (id: {}) already gone or renewed before eviction",
                    record.endpoint_name,
                    record.registration_id
                ),
            }
        }

        evicted
    }

    /// Shared removal path for explicit deregistration and eviction
    fn remove_if<F>(&self, registration_id: &str, should_remove: F) -> Option<EndpointRecord>
    where
        F: Fn(&EndpointRecord) -> bool,
    {
        let endpoint_name = self.index.name_for_id(registration_id)?;
        let _guard = self.locks.lock(&endpoint_name);

        let entry = self.active_entry(&endpoint_name, registration_id)?;
        if !should_remove(entry.record()) {
            return None;
        }

        let removed = self.index.remove(&endpoint_name)?;
        if let Some(handle) = removed.handle {
            self.withdraw(handle, &endpoint_name);
        }
        metrics::set_active_endpoints(self.index.len() as i64);

        self.listeners.notify_unregistered(removed.record());
        Some(removed.device.into_record())
    }

    /// The entry for `endpoint_name`, if it still carries `registration_id`
    fn active_entry(&self, endpoint_name: &str, registration_id: &str) -> Option<IndexEntry> {
        self.index
            .get(endpoint_name)
            .filter(|entry| entry.record().registration_id == registration_id)
    }

    /// Publish to the directory, retrying once as a fresh publication
    fn publish(&self, device: &EndpointDevice) -> Option<DirectoryHandle> {
        let endpoint_name = device.endpoint_name();

        for attempt in 1..=2 {
            let metadata = device.metadata(self.clock.now());
            match self.directory.publish(endpoint_name, device.record(), metadata) {
                Ok(handle) => {
                    trace!("Published {} as {}", endpoint_name, handle);
                    return Some(handle);
                }
                Err(e) if attempt == 1 => {
                    warn!("Failed to publish {}, publishing again: {}", endpoint_name, e);
                }
                Err(e) => {
                    error!(
                        "Failed to publish {} to the directory, keeping it unpublished: {}",
                        endpoint_name, e
                    );
                }
            }
        }

        None
    }

    fn withdraw(&self, handle: DirectoryHandle, endpoint_name: &str) {
        if let Err(e) = self.directory.withdraw(handle) {
            warn!("Could not withdraw {} for {}: {}", handle, endpoint_name, e);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Active record for an endpoint name
    pub fn get(&self, endpoint_name: &str) -> Option<EndpointRecord> {
        self.index
            .get(endpoint_name)
            .map(|entry| entry.device.into_record())
    }

    /// Active record for a registration id
    pub fn find_by_registration_id(&self, registration_id: &str) -> Option<EndpointRecord> {
        let endpoint_name = self.index.name_for_id(registration_id)?;
        self.active_entry(&endpoint_name, registration_id)
            .map(|entry| entry.device.into_record())
    }

    /// Device handle for an endpoint name
    pub fn device(&self, endpoint_name: &str) -> Option<EndpointDevice> {
        self.index.get(endpoint_name).map(|entry| entry.device)
    }

    /// Point-in-time copy of all active records
    pub fn snapshot(&self) -> Vec<EndpointRecord> {
        self.index.records()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    pub fn add_listener(&self, listener: Arc<dyn RegistryListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{InMemoryDirectory, MetadataQuery};
    use crate::registry::ManualClock;
    use chrono::TimeDelta;
    use parking_lot::Mutex;
    use std::net::{IpAddr, Ipv4Addr};

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Registered(String),
        Updated(String),
        Unregistered(String),
    }

    #[derive(Default)]
    struct RecordingListener {
        events: Mutex<Vec<Seen>>,
    }

    impl RecordingListener {
        fn events(&self) -> Vec<Seen> {
            self.events.lock().clone()
        }
    }

    impl RegistryListener for RecordingListener {
        fn registered(&self, record: &EndpointRecord) {
            self.events
                .lock()
                .push(Seen::Registered(record.registration_id.clone()));
        }

        fn updated(&self, _update: &RegistrationUpdate, record: &EndpointRecord) {
            self.events
                .lock()
                .push(Seen::Updated(record.registration_id.clone()));
        }

        fn unregistered(&self, record: &EndpointRecord) {
            self.events
                .lock()
                .push(Seen::Unregistered(record.registration_id.clone()));
        }
    }

    /// Directory whose first `failures` publishes fail
    struct FlakyDirectory {
        inner: InMemoryDirectory,
        failures: Mutex<usize>,
    }

    impl Directory for FlakyDirectory {
        fn publish(
            &self,
            key: &str,
            record: &EndpointRecord,
            metadata: crate::directory::DirectoryMetadata,
        ) -> RegistryResult<DirectoryHandle> {
            let mut failures = self.failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(RegistryError::Directory("unavailable".to_string()));
            }
            self.inner.publish(key, record, metadata)
        }

        fn republish(
            &self,
            handle: DirectoryHandle,
            metadata: crate::directory::DirectoryMetadata,
        ) -> RegistryResult<()> {
            self.inner.republish(handle, metadata)
        }

        fn withdraw(&self, handle: DirectoryHandle) -> RegistryResult<()> {
            self.inner.withdraw(handle)
        }

        fn find_by_key(&self, key: &str) -> Option<DirectoryHandle> {
            self.inner.find_by_key(key)
        }

        fn find_by_metadata(&self, query: &MetadataQuery) -> Option<DirectoryHandle> {
            self.inner.find_by_metadata(query)
        }
    }

    fn record(id: &str, name: &str, lifetime_secs: u64, at: DateTime<Utc>) -> EndpointRecord {
        EndpointRecord::builder(id, name, IpAddr::V4(Ipv4Addr::LOCALHOST), 5683)
            .lifetime_secs(lifetime_secs)
            .registered_at(at)
            .build()
    }

    fn setup() -> (Registry, Arc<ManualClock>, Arc<RecordingListener>) {
        let clock = Arc::new(ManualClock::default());
        let registry = Registry::new(clock.clone());
        let listener = Arc::new(RecordingListener::default());
        registry.add_listener(listener.clone());
        (registry, clock, listener)
    }

    #[test]
    fn test_register_and_lookup() {
        let (registry, clock, listener) = setup();

        let stale = registry.register(record("r1", "dev-1", 10, clock.now())).unwrap();

        assert!(stale.is_none());
        assert_eq!(registry.get("dev-1").unwrap().registration_id, "r1");
        assert_eq!(registry.find_by_registration_id("r1").unwrap().endpoint_name, "dev-1");
        assert_eq!(registry.len(), 1);
        assert_eq!(listener.events(), vec![Seen::Registered("r1".to_string())]);
    }

    #[test]
    fn test_register_rejects_invalid_records() {
        let (registry, clock, listener) = setup();

        assert!(matches!(
            registry.register(record("r1", "", 10, clock.now())),
            Err(RegistryError::Validation(_))
        ));
        assert!(matches!(
            registry.register(record("", "dev-1", 10, clock.now())),
            Err(RegistryError::Validation(_))
        ));
        assert!(registry.is_empty());
        assert!(listener.events().is_empty());
    }

    #[test]
    fn test_register_rejects_id_held_by_other_endpoint() {
        let (registry, clock, _listener) = setup();
        registry.register(record("r1", "dev-1", 10, clock.now())).unwrap();

        let result = registry.register(record("r1", "dev-2", 10, clock.now()));

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateRegistrationId { .. })
        ));
        assert!(registry.get("dev-2").is_none());
        assert_eq!(registry.get("dev-1").unwrap().registration_id, "r1");
    }

    #[test]
    fn test_reregister_returns_stale_record() {
        let (registry, clock, listener) = setup();
        registry.register(record("r1", "dev-1", 10, clock.now())).unwrap();

        let stale = registry
            .register(record("r2", "dev-1", 10, clock.now()))
            .unwrap()
            .unwrap();

        assert_eq!(stale.registration_id, "r1");
        assert_eq!(registry.get("dev-1").unwrap().registration_id, "r2");
        assert!(registry.find_by_registration_id("r1").is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(
            listener.events(),
            vec![
                Seen::Registered("r1".to_string()),
                Seen::Unregistered("r1".to_string()),
                Seen::Registered("r2".to_string()),
            ]
        );
    }

    #[test]
    fn test_update_extends_lease() {
        let (registry, clock, listener) = setup();
        registry.register(record("r1", "dev-1", 10, clock.now())).unwrap();
        let before = registry.get("dev-1").unwrap().expires_at();

        clock.advance(TimeDelta::seconds(1));
        let updated = registry
            .update(RegistrationUpdate::renew("r1").with_lifetime(50_010))
            .unwrap()
            .unwrap();

        assert_eq!(updated.lifetime_secs, 50_010);
        assert!(updated.expires_at() - before >= TimeDelta::seconds(50_000));
        assert_eq!(registry.get("dev-1").unwrap(), updated);
        assert_eq!(listener.events().last(), Some(&Seen::Updated("r1".to_string())));
    }

    #[test]
    fn test_unknown_registration_id_is_a_soft_no_op() {
        let (registry, clock, listener) = setup();
        registry.register(record("r1", "dev-1", 10, clock.now())).unwrap();
        let before = registry.snapshot();

        assert!(registry.update(RegistrationUpdate::renew("nope")).unwrap().is_none());
        assert!(registry.deregister("nope").is_none());

        assert_eq!(registry.snapshot(), before);
        assert_eq!(listener.events(), vec![Seen::Registered("r1".to_string())]);
    }

    #[test]
    fn test_deregister() {
        let (registry, clock, listener) = setup();
        registry.register(record("r1", "dev-1", 10, clock.now())).unwrap();

        let removed = registry.deregister("r1").unwrap();

        assert_eq!(removed.endpoint_name, "dev-1");
        assert!(registry.get("dev-1").is_none());
        assert!(registry.deregister("r1").is_none());
        assert_eq!(
            listener.events(),
            vec![
                Seen::Registered("r1".to_string()),
                Seen::Unregistered("r1".to_string()),
            ]
        );
    }

    #[test]
    fn test_sweep_only_evicts_expired() {
        let (registry, clock, listener) = setup();
        let start = clock.now();
        registry.register(record("r1", "short", 10, start)).unwrap();
        registry.register(record("r2", "long", 100, start)).unwrap();

        assert!(registry.sweep(start + TimeDelta::seconds(10)).is_empty());

        let evicted = registry.sweep(start + TimeDelta::seconds(11));

        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].registration_id, "r1");
        assert!(registry.get("short").is_none());
        assert!(registry.get("long").is_some());
        assert!(listener
            .events()
            .contains(&Seen::Unregistered("r1".to_string())));
    }

    #[test]
    fn test_sweep_spares_renewed_registration() {
        let (registry, clock, _listener) = setup();
        let start = clock.now();
        registry.register(record("r1", "dev-1", 10, start)).unwrap();

        clock.set(start + TimeDelta::seconds(9));
        registry.update(RegistrationUpdate::renew("r1")).unwrap();

        assert!(registry.sweep(start + TimeDelta::seconds(11)).is_empty());
        assert!(registry.get("dev-1").is_some());
    }

    #[test]
    fn test_directory_follows_lifecycle() {
        let clock = Arc::new(ManualClock::default());
        let directory = Arc::new(InMemoryDirectory::new());
        let registry = Registry::new(clock.clone()).with_directory(directory.clone());
        let by_id = |id: &str| directory.find_by_metadata(&MetadataQuery::RegistrationId(id.to_string()));

        registry.register(record("r1", "dev-1", 10, clock.now())).unwrap();
        let handle = by_id("r1").unwrap();
        let original_expiry = directory.get(handle).unwrap().metadata.expiration_millis().unwrap();

        clock.advance(TimeDelta::seconds(1));
        registry
            .update(RegistrationUpdate::renew("r1").with_lifetime(50_010))
            .unwrap();
        let updated_expiry = directory.get(handle).unwrap().metadata.expiration_millis().unwrap();
        assert!(updated_expiry > original_expiry);

        registry.register(record("r2", "dev-1", 10, clock.now())).unwrap();
        assert!(by_id("r1").is_none());
        assert!(by_id("r2").is_some());
        assert_eq!(directory.len(), 1);

        registry.deregister("r2");
        assert!(directory.is_empty());
    }

    #[test]
    fn test_publish_is_retried_once() {
        let clock = Arc::new(ManualClock::default());
        let directory = Arc::new(FlakyDirectory {
            inner: InMemoryDirectory::new(),
            failures: Mutex::new(1),
        });
        let registry = Registry::new(clock.clone()).with_directory(directory.clone());

        registry.register(record("r1", "dev-1", 10, clock.now())).unwrap();

        assert!(directory.find_by_key("dev-1").is_some());
    }

    #[test]
    fn test_registration_survives_directory_outage() {
        let clock = Arc::new(ManualClock::default());
        let directory = Arc::new(FlakyDirectory {
            inner: InMemoryDirectory::new(),
            failures: Mutex::new(2),
        });
        let registry = Registry::new(clock.clone()).with_directory(directory.clone());

        registry.register(record("r1", "dev-1", 10, clock.now())).unwrap();

        assert!(directory.find_by_key("dev-1").is_none());
        assert!(registry.get("dev-1").is_some());
        assert!(registry.update(RegistrationUpdate::renew("r1")).unwrap().is_some());
        assert!(registry.deregister("r1").is_some());
    }

    #[test]
    fn test_publish_is_retried_on_reregister() {
        let clock = Arc::new(ManualClock::default());
        let directory = Arc::new(FlakyDirectory {
            inner: InMemoryDirectory::new(),
            failures: Mutex::new(0),
        });
        let registry = Registry::new(clock.clone()).with_directory(directory.clone());
        let by_id = |id: &str| {
            directory
                .inner
                .find_by_metadata(&MetadataQuery::RegistrationId(id.to_string()))
        };

        registry.register(record("r1", "dev-1", 10, clock.now())).unwrap();
        assert!(by_id("r1").is_some());

        *directory.failures.lock() = 1;
        let stale = registry
            .register(record("r2", "dev-1", 10, clock.now()))
            .unwrap()
            .unwrap();

        assert_eq!(stale.registration_id, "r1");
        assert!(by_id("r1").is_none());
        let handle = by_id("r2").unwrap();
        assert_eq!(directory.inner.len(), 1);
        assert_eq!(registry.index.get("dev-1").unwrap().handle, Some(handle));
    }

    #[test]
    fn test_register_stamps_lease_from_registry_clock() {
        let (registry, clock, _listener) = setup();
        clock.advance(TimeDelta::days(1));
        let record = EndpointRecord::builder("r1", "dev-1", IpAddr::V4(Ipv4Addr::LOCALHOST), 5683)
            .lifetime_secs(10)
            .build();

        registry.register(record).unwrap();

        let active = registry.get("dev-1").unwrap();
        assert_eq!(active.registered_at, clock.now());
        assert_eq!(active.last_renewed_at, clock.now());
        assert!(!active.is_expired_at(clock.now()));
        assert!(registry.sweep(clock.now()).is_empty());
        assert!(registry.get("dev-1").is_some());
    }

    #[test]
    fn test_removed_listener_is_not_notified() {
        let (registry, clock, listener) = setup();
        let other = Arc::new(RecordingListener::default());
        let id = registry.add_listener(other.clone());

        assert!(registry.remove_listener(id));
        registry.register(record("r1", "dev-1", 10, clock.now())).unwrap();

        assert!(other.events().is_empty());
        assert_eq!(listener.events().len(), 1);
    }

    #[test]
    fn test_concurrent_registration_race() {
        const N: usize = 16;
        let clock = Arc::new(ManualClock::default());
        let registry = Arc::new(Registry::new(clock.clone()));
        let listener = Arc::new(RecordingListener::default());
        registry.add_listener(listener.clone());

        let handles: Vec<_> = (0..N)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let at = clock.now();
                std::thread::spawn(move || {
                    registry
                        .register(record(&format!("r{}", i), "dev-1", 10, at))
                        .unwrap()
                })
            })
            .collect();

        let stale_count = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(Option::is_some)
            .count();

        let events = listener.events();
        let registered = events
            .iter()
            .filter(|e| matches!(e, Seen::Registered(_)))
            .count();
        let unregistered = events
            .iter()
            .filter(|e| matches!(e, Seen::Unregistered(_)))
            .count();

        assert_eq!(registry.len(), 1);
        assert_eq!(registered, N);
        assert_eq!(unregistered, N - 1);
        assert_eq!(stale_count, N - 1);

        let active = registry.get("dev-1").unwrap();
        assert_eq!(
            events.last(),
            Some(&Seen::Registered(active.registration_id.clone()))
        );
    }

    #[test]
    fn test_concurrent_deregister_and_sweep_notify_once() {
        let clock = Arc::new(ManualClock::default());
        let registry = Arc::new(Registry::new(clock.clone()));
        let listener = Arc::new(RecordingListener::default());
        registry.add_listener(listener.clone());

        let start = clock.now();
        for i in 0..32 {
            registry
                .register(record(&format!("r{}", i), &format!("dev-{}", i), 1, start))
                .unwrap();
        }
        let later = start + TimeDelta::seconds(5);

        let sweeper = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.sweep(later).len())
        };
        let deregistered = (0..32)
            .filter(|i| registry.deregister(&format!("r{}", i)).is_some())
            .count();
        let evicted = sweeper.join().unwrap();

        assert_eq!(deregistered + evicted, 32);
        assert!(registry.is_empty());
        let unregistered = listener
            .events()
            .iter()
            .filter(|e| matches!(e, Seen::Unregistered(_)))
            .count();
        assert_eq!(unregistered, 32);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let (registry, clock, _listener) = setup();

        registry.register(record("r1", "dev-1", 10, clock.now())).unwrap();
        assert_eq!(registry.get("dev-1").unwrap().registration_id, "r1");
        let before = registry.get("dev-1").unwrap().expires_at();

        let updated = registry
            .update(RegistrationUpdate::renew("r1").with_lifetime(50_010))
            .unwrap()
            .unwrap();
        assert!(updated.expires_at() - before >= TimeDelta::seconds(50_000));

        let stale = registry
            .register(record("r2", "dev-1", 10, clock.now()))
            .unwrap()
            .unwrap();
        assert_eq!(stale.registration_id, "r1");
        assert_eq!(registry.get("dev-1").unwrap().registration_id, "r2");

        registry.deregister("r2").unwrap();
        assert!(registry.get("dev-1").is_none());
    }
}
