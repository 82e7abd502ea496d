//! Endpoint record representing one registered device

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::str::FromStr;

use super::{RegistryError, RegistryResult};

/// Default protocol version advertised by devices that omit it
pub const DEFAULT_PROTOCOL_VERSION: &str = "1.0";

/// Default lease duration (24 hours)
pub const DEFAULT_LIFETIME_SECS: u64 = 86_400;

/// Opaque registration id generator
pub struct RegistrationId;

impl RegistrationId {
    /// Generate a fresh registration id
    pub fn generate() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Delivery-mode hint advertised by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingMode {
    U,
    UQ,
    S,
    SQ,
    US,
    UQS,
}

impl Default for BindingMode {
    fn default() -> Self {
        BindingMode::U
    }
}

impl BindingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingMode::U => "U",
            BindingMode::UQ => "UQ",
            BindingMode::S => "S",
            BindingMode::SQ => "SQ",
            BindingMode::US => "US",
            BindingMode::UQS => "UQS",
        }
    }

    /// Whether the device queues requests while offline
    pub fn is_queued(&self) -> bool {
        matches!(self, BindingMode::UQ | BindingMode::SQ | BindingMode::UQS)
    }
}

impl std::fmt::Display for BindingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingMode {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "U" => Ok(BindingMode::U),
            "UQ" => Ok(BindingMode::UQ),
            "S" => Ok(BindingMode::S),
            "SQ" => Ok(BindingMode::SQ),
            "US" => Ok(BindingMode::US),
            "UQS" => Ok(BindingMode::UQS),
            other => Err(RegistryError::validation(format!(
                "Unknown binding mode: {}",
                other
            ))),
        }
    }
}

/// One entry of the device's advertised resource tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkObject {
    /// Link path, e.g. "/3/0"
    pub path: String,
    /// Link attributes, e.g. `ct=11543`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl LinkObject {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl std::fmt::Display for LinkObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.path)?;
        for (key, value) in &self.attributes {
            write!(f, ";{}={}", key, value)?;
        }
        Ok(())
    }
}

/// Canonical state of one registered device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub registration_id: String,
    pub endpoint_name: String,
    pub address: IpAddr,
    pub port: u16,
    pub protocol_version: String,
    pub lifetime_secs: u64,
    pub binding_mode: BindingMode,
    pub sms_number: Option<String>,
    pub links: Vec<LinkObject>,
    pub registered_at: DateTime<Utc>,
    pub last_renewed_at: DateTime<Utc>,
}

impl EndpointRecord {
    /// Start building a record; timestamps default to now
    pub fn builder(
        registration_id: impl Into<String>,
        endpoint_name: impl Into<String>,
        address: IpAddr,
        port: u16,
    ) -> EndpointRecordBuilder {
        EndpointRecordBuilder::new(registration_id, endpoint_name, address, port)
    }

    /// Lease expiry, derived from the last renewal and the current lifetime
    pub fn expires_at(&self) -> DateTime<Utc> {
        lease_end(self.last_renewed_at, self.lifetime_secs)
    }

    /// Whether the lease has run out at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }

    /// Check the invariants a record must satisfy before it can be registered
    pub fn validate(&self) -> RegistryResult<()> {
        if self.endpoint_name.is_empty() {
            return Err(RegistryError::validation("Endpoint name cannot be empty"));
        }
        if self.registration_id.is_empty() {
            return Err(RegistryError::validation("Registration id cannot be empty"));
        }
        Ok(())
    }
}

/// `start + lifetime_secs`, saturating at the maximum representable instant
pub(crate) fn lease_end(start: DateTime<Utc>, lifetime_secs: u64) -> DateTime<Utc> {
    i64::try_from(lifetime_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|lifetime| start.checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Builder for [`EndpointRecord`]
#[derive(Debug, Clone)]
pub struct EndpointRecordBuilder {
    record: EndpointRecord,
}

impl EndpointRecordBuilder {
    fn new(
        registration_id: impl Into<String>,
        endpoint_name: impl Into<String>,
        address: IpAddr,
        port: u16,
    ) -> Self {
        let now = Utc::now();
        Self {
            record: EndpointRecord {
                registration_id: registration_id.into(),
                endpoint_name: endpoint_name.into(),
                address,
                port,
                protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
                lifetime_secs: DEFAULT_LIFETIME_SECS,
                binding_mode: BindingMode::default(),
                sms_number: None,
                links: Vec::new(),
                registered_at: now,
                last_renewed_at: now,
            },
        }
    }

    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.record.protocol_version = version.into();
        self
    }

    pub fn lifetime_secs(mut self, lifetime_secs: u64) -> Self {
        self.record.lifetime_secs = lifetime_secs;
        self
    }

    pub fn binding_mode(mut self, mode: BindingMode) -> Self {
        self.record.binding_mode = mode;
        self
    }

    pub fn sms_number(mut self, number: impl Into<String>) -> Self {
        self.record.sms_number = Some(number.into());
        self
    }

    pub fn links(mut self, links: Vec<LinkObject>) -> Self {
        self.record.links = links;
        self
    }

    /// Set both registration and renewal time
    pub fn registered_at(mut self, at: DateTime<Utc>) -> Self {
        self.record.registered_at = at;
        self.record.last_renewed_at = at;
        self
    }

    pub fn last_renewed_at(mut self, at: DateTime<Utc>) -> Self {
        self.record.last_renewed_at = at;
        self
    }

    pub fn build(self) -> EndpointRecord {
        self.record
    }
}
