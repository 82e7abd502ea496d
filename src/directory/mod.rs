//! Directory service collaborator
//!
//! The registry publishes per-endpoint metadata to a keyed directory so other
//! components can discover online devices. The directory is a sink only; the
//! registry never queries it for its own lookups.

mod memory;

pub use memory::*;

use serde::{Deserialize, Serialize};

use crate::models::{EndpointRecord, LinkObject, RegistryResult};

/// Category tag marking a directory entry as a device
pub const DEVICE_CATEGORY: &str = "LWM2MClient";

/// Opaque handle to one published directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectoryHandle(pub u64);

impl std::fmt::Display for DirectoryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "directory-entry-{}", self.0)
    }
}

/// Metadata published alongside an endpoint record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryMetadata {
    pub registration_id: String,
    pub category: String,
    /// Lease expiry as epoch milliseconds, string encoded
    pub expiration: String,
    pub links: Vec<LinkObject>,
    /// Stable publication key, equal to the endpoint name
    pub service_key: String,
}

impl DirectoryMetadata {
    /// Parsed expiration in epoch milliseconds
    pub fn expiration_millis(&self) -> Option<i64> {
        self.expiration.parse().ok()
    }
}

/// Metadata filter for [`Directory::find_by_metadata`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataQuery {
    RegistrationId(String),
    Category(String),
}

impl MetadataQuery {
    pub fn matches(&self, metadata: &DirectoryMetadata) -> bool {
        match self {
            MetadataQuery::RegistrationId(id) => &metadata.registration_id == id,
            MetadataQuery::Category(category) => &metadata.category == category,
        }
    }
}

/// Keyed directory of published endpoint entries
pub trait Directory: Send + Sync {
    /// Publish a new entry under `key`
    fn publish(
        &self,
        key: &str,
        record: &EndpointRecord,
        metadata: DirectoryMetadata,
    ) -> RegistryResult<DirectoryHandle>;

    /// Replace the metadata of a published entry
    fn republish(&self, handle: DirectoryHandle, metadata: DirectoryMetadata) -> RegistryResult<()>;

    /// Remove a published entry; fails if it was already withdrawn
    fn withdraw(&self, handle: DirectoryHandle) -> RegistryResult<()>;

    fn find_by_key(&self, key: &str) -> Option<DirectoryHandle>;

    fn find_by_metadata(&self, query: &MetadataQuery) -> Option<DirectoryHandle>;
}

/// Directory that accepts and discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDirectory;

impl Directory for NullDirectory {
    fn publish(
        &self,
        _key: &str,
        _record: &EndpointRecord,
        _metadata: DirectoryMetadata,
    ) -> RegistryResult<DirectoryHandle> {
        Ok(DirectoryHandle(0))
    }

    fn republish(&self, _handle: DirectoryHandle, _metadata: DirectoryMetadata) -> RegistryResult<()> {
        Ok(())
    }

    fn withdraw(&self, _handle: DirectoryHandle) -> RegistryResult<()> {
        Ok(())
    }

    fn find_by_key(&self, _key: &str) -> Option<DirectoryHandle> {
        None
    }

    fn find_by_metadata(&self, _query: &MetadataQuery) -> Option<DirectoryHandle> {
        None
    }
}
