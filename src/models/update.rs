//! Registration update (renew) delta

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::{BindingMode, EndpointRecord, LinkObject};

/// Fields a device may change when it renews its registration.
///
/// Unset fields keep the value of the active record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationUpdate {
    pub registration_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_mode: Option<BindingMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<LinkObject>>,
}

impl RegistrationUpdate {
    /// An update that only renews the lease
    pub fn renew(registration_id: impl Into<String>) -> Self {
        Self {
            registration_id: registration_id.into(),
            ..Default::default()
        }
    }

    pub fn with_address(mut self, address: IpAddr, port: u16) -> Self {
        self.address = Some(address);
        self.port = Some(port);
        self
    }

    pub fn with_lifetime(mut self, lifetime_secs: u64) -> Self {
        self.lifetime_secs = Some(lifetime_secs);
        self
    }

    pub fn with_binding_mode(mut self, mode: BindingMode) -> Self {
        self.binding_mode = Some(mode);
        self
    }

    pub fn with_sms_number(mut self, number: impl Into<String>) -> Self {
        self.sms_number = Some(number.into());
        self
    }

    pub fn with_links(mut self, links: Vec<LinkObject>) -> Self {
        self.links = Some(links);
        self
    }

    /// Merge this delta onto `current`, stamping the renewal at `now`.
    ///
    /// Identity fields and the original registration time are carried over.
    pub fn apply_to(&self, current: &EndpointRecord, now: DateTime<Utc>) -> EndpointRecord {
        EndpointRecord {
            registration_id: current.registration_id.clone(),
            endpoint_name: current.endpoint_name.clone(),
            address: self.address.unwrap_or(current.address),
            port: self.port.unwrap_or(current.port),
            protocol_version: current.protocol_version.clone(),
            lifetime_secs: self.lifetime_secs.unwrap_or(current.lifetime_secs),
            binding_mode: self.binding_mode.unwrap_or(current.binding_mode),
            sms_number: self
                .sms_number
                .clone()
                .or_else(|| current.sms_number.clone()),
            links: self.links.clone().unwrap_or_else(|| current.links.clone()),
            registered_at: current.registered_at,
            last_renewed_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use std::net::Ipv4Addr;

    fn record() -> EndpointRecord {
        EndpointRecord::builder("r1", "dev-1", IpAddr::V4(Ipv4Addr::LOCALHOST), 5683)
            .lifetime_secs(10)
            .sms_number("01701234567")
            .links(vec![LinkObject::new("/3/0"), LinkObject::new("/1/0")])
            .registered_at(Utc::now() - TimeDelta::minutes(5))
            .build()
    }

    #[test]
    fn test_unset_fields_are_retained() {
        let current = record();
        let now = Utc::now();

        let merged = RegistrationUpdate::renew("r1").apply_to(&current, now);

        assert_eq!(merged.address, current.address);
        assert_eq!(merged.port, current.port);
        assert_eq!(merged.lifetime_secs, 10);
        assert_eq!(merged.sms_number.as_deref(), Some("01701234567"));
        assert_eq!(merged.links.len(), 2);
        assert_eq!(merged.registered_at, current.registered_at);
        assert_eq!(merged.last_renewed_at, now);
    }

    #[test]
    fn test_set_fields_replace() {
        let current = record();
        let now = Utc::now();
        let new_address = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));

        let merged = RegistrationUpdate::renew("r1")
            .with_address(new_address, 5684)
            .with_lifetime(50_010)
            .with_binding_mode(BindingMode::UQS)
            .with_sms_number("00000000")
            .with_links(vec![LinkObject::new("/3/1")])
            .apply_to(&current, now);

        assert_eq!(merged.address, new_address);
        assert_eq!(merged.port, 5684);
        assert_eq!(merged.lifetime_secs, 50_010);
        assert_eq!(merged.binding_mode, BindingMode::UQS);
        assert_eq!(merged.sms_number.as_deref(), Some("00000000"));
        assert_eq!(merged.links, vec![LinkObject::new("/3/1")]);
        assert_eq!(merged.registration_id, "r1");
        assert_eq!(merged.endpoint_name, "dev-1");
        assert!(merged.expires_at() > current.expires_at());
    }
}
