//! Endpoint Registry - Lease-Based Device Registration
//!
//! A registry of device endpoints registered under leases, providing:
//! - Register / update / deregister with one active record per endpoint
//! - Lookup by endpoint name and by registration id
//! - Synchronous lifecycle listeners and topic-addressed events
//! - Background eviction of expired leases
//! - Directory publication of active registrations

pub mod config;
pub mod models;
pub mod device;
pub mod directory;
pub mod registry;
pub mod events;
pub mod metrics;

// Re-export commonly used types
pub use config::Settings;
pub use models::{EndpointRecord, RegistrationUpdate, RegistryError, RegistryResult};
pub use device::{EndpointDevice, RequestSender};
pub use directory::{Directory, InMemoryDirectory};
pub use registry::{Clock, LeaseSweeper, Registry, RegistryListener, SweeperConfig, SystemClock};
pub use events::{BroadcastEventSink, EventSink, LifecycleEventPublisher, ObservationPublisher};

/// Version of the endpoint-registry
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
