//! Per-endpoint device handle

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use super::{
    DeviceRequest, DeviceResponse, DiscoverRequest, ExecuteRequest, ObserveRequest, ReadRequest,
    RequestSender, WriteAttributesRequest, WriteRequest,
};
use crate::directory::{DirectoryMetadata, DEVICE_CATEGORY};
use crate::models::{lease_end, EndpointRecord, LinkObject, RegistryError, RegistryResult};

/// Default time to wait for a device response
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(2000);

/// A registered endpoint together with the transport used to reach it.
///
/// Device operations are forwarded to the transport as-is; there is no retry.
#[derive(Clone)]
pub struct EndpointDevice {
    record: EndpointRecord,
    sender: Arc<dyn RequestSender>,
    response_timeout: Duration,
}

impl EndpointDevice {
    pub fn new(record: EndpointRecord, sender: Arc<dyn RequestSender>) -> Self {
        Self {
            record,
            sender,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn record(&self) -> &EndpointRecord {
        &self.record
    }

    pub fn into_record(self) -> EndpointRecord {
        self.record
    }

    pub fn endpoint_name(&self) -> &str {
        &self.record.endpoint_name
    }

    pub fn links(&self) -> &[LinkObject] {
        &self.record.links
    }

    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    pub async fn read(&self, request: ReadRequest) -> RegistryResult<DeviceResponse> {
        self.send(DeviceRequest::Read(request)).await
    }

    pub async fn write(&self, request: WriteRequest) -> RegistryResult<DeviceResponse> {
        self.send(DeviceRequest::Write(request)).await
    }

    pub async fn write_attributes(
        &self,
        request: WriteAttributesRequest,
    ) -> RegistryResult<DeviceResponse> {
        self.send(DeviceRequest::WriteAttributes(request)).await
    }

    pub async fn execute(&self, request: ExecuteRequest) -> RegistryResult<DeviceResponse> {
        self.send(DeviceRequest::Execute(request)).await
    }

    pub async fn observe(&self, request: ObserveRequest) -> RegistryResult<DeviceResponse> {
        self.send(DeviceRequest::Observe(request)).await
    }

    pub async fn discover(&self, request: DiscoverRequest) -> RegistryResult<DeviceResponse> {
        self.send(DeviceRequest::Discover(request)).await
    }

    async fn send(&self, request: DeviceRequest) -> RegistryResult<DeviceResponse> {
        trace!(
            "Sending {} request for {} to {}",
            request.kind(),
            request.path(),
            self.record.endpoint_name
        );
        self.sender
            .send(&self.record, request, self.response_timeout)
            .await
    }

    /// Directory metadata for this endpoint, with the expiry computed from `now`
    pub fn metadata(&self, now: DateTime<Utc>) -> DirectoryMetadata {
        let expiration = lease_end(now, self.record.lifetime_secs).timestamp_millis();

        DirectoryMetadata {
            registration_id: self.record.registration_id.clone(),
            category: DEVICE_CATEGORY.to_string(),
            expiration: expiration.to_string(),
            links: self.record.links.clone(),
            service_key: self.record.endpoint_name.clone(),
        }
    }

    /// Swap in a newer record for the same endpoint.
    ///
    /// A record for a different endpoint name is rejected with
    /// [`RegistryError::EndpointMismatch`].
    pub fn replace_record(&mut self, record: EndpointRecord) -> RegistryResult<()> {
        if record.endpoint_name != self.record.endpoint_name {
            return Err(RegistryError::endpoint_mismatch(
                &self.record.endpoint_name,
                &record.endpoint_name,
            ));
        }
        self.record = record;
        Ok(())
    }
}

impl std::fmt::Debug for EndpointDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointDevice")
            .field("record", &self.record)
            .field("response_timeout", &self.response_timeout)
            .finish()
    }
}
