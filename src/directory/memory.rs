//! In-process directory implementation

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use super::{Directory, DirectoryHandle, DirectoryMetadata, MetadataQuery};
use crate::models::{EndpointRecord, RegistryError, RegistryResult};

/// A published directory entry
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub key: String,
    pub record: EndpointRecord,
    pub metadata: DirectoryMetadata,
}

/// Directory backed by a process-local map
#[derive(Debug)]
pub struct InMemoryDirectory {
    entries: RwLock<HashMap<DirectoryHandle, DirectoryEntry>>,
    next_handle: AtomicU64,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Get a published entry
    pub fn get(&self, handle: DirectoryHandle) -> Option<DirectoryEntry> {
        self.entries.read().get(&handle).cloned()
    }

    /// Number of published entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory for InMemoryDirectory {
    fn publish(
        &self,
        key: &str,
        record: &EndpointRecord,
        metadata: DirectoryMetadata,
    ) -> RegistryResult<DirectoryHandle> {
        let handle = DirectoryHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.entries.write().insert(
            handle,
            DirectoryEntry {
                key: key.to_string(),
                record: record.clone(),
                metadata,
            },
        );
        trace!("Published {} under key {}", handle, key);
        Ok(handle)
    }

    fn republish(&self, handle: DirectoryHandle, metadata: DirectoryMetadata) -> RegistryResult<()> {
        let mut entries = self.entries.write();
        let entry = entries.get_mut(&handle).ok_or_else(|| {
            RegistryError::Directory(format!("{} has already been withdrawn", handle))
        })?;
        entry.metadata = metadata;
        Ok(())
    }

    fn withdraw(&self, handle: DirectoryHandle) -> RegistryResult<()> {
        self.entries
            .write()
            .remove(&handle)
            .map(|entry| trace!("Withdrew {} for key {}", handle, entry.key))
            .ok_or_else(|| RegistryError::Directory(format!("{} has already been withdrawn", handle)))
    }

    fn find_by_key(&self, key: &str) -> Option<DirectoryHandle> {
        self.entries
            .read()
            .iter()
            .find(|(_, entry)| entry.key == key)
            .map(|(handle, _)| *handle)
    }

    fn find_by_metadata(&self, query: &MetadataQuery) -> Option<DirectoryHandle> {
        self.entries
            .read()
            .iter()
            .find(|(_, entry)| query.matches(&entry.metadata))
            .map(|(handle, _)| *handle)
    }
}
