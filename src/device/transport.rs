//! Request transport towards registered devices

use async_trait::async_trait;
use std::time::Duration;

use super::{DeviceRequest, DeviceResponse};
use crate::models::{EndpointRecord, RegistryError, RegistryResult};

/// Sends typed requests to a registered device.
///
/// A send either yields the device's response or fails with
/// [`RegistryError::Transport`] / [`RegistryError::Timeout`]; "no answer" is
/// always an error, never an empty success.
#[async_trait]
pub trait RequestSender: Send + Sync {
    async fn send(
        &self,
        record: &EndpointRecord,
        request: DeviceRequest,
        timeout: Duration,
    ) -> RegistryResult<DeviceResponse>;
}

/// Sender used when no device transport is wired in; every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnreachableSender;

#[async_trait]
impl RequestSender for UnreachableSender {
    async fn send(
        &self,
        record: &EndpointRecord,
        request: DeviceRequest,
        _timeout: Duration,
    ) -> RegistryResult<DeviceResponse> {
        Err(RegistryError::Transport(format!(
            "No transport configured for {} request to {}",
            request.kind(),
            record.endpoint_name
        )))
    }
}
