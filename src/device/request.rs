//! Typed requests and responses exchanged with a registered device

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::ObjectPath;

/// Read the value of an object, instance, or resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadRequest {
    pub path: ObjectPath,
}

/// Write a new value to a resource or instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub path: ObjectPath,
    pub value: serde_json::Value,
    /// Replace the whole instance instead of updating the given resources
    #[serde(default)]
    pub replace: bool,
}

/// Set notification attributes (pmin, pmax, gt, lt, st) on a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteAttributesRequest {
    pub path: ObjectPath,
    pub attributes: BTreeMap<String, String>,
}

/// Execute a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub path: ObjectPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Start observing a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserveRequest {
    pub path: ObjectPath,
}

/// Discover the attributes of a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverRequest {
    pub path: ObjectPath,
}

impl ReadRequest {
    pub fn new(path: ObjectPath) -> Self {
        Self { path }
    }
}

impl WriteRequest {
    pub fn new(path: ObjectPath, value: serde_json::Value) -> Self {
        Self {
            path,
            value,
            replace: false,
        }
    }
}

impl WriteAttributesRequest {
    pub fn new(path: ObjectPath) -> Self {
        Self {
            path,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl ExecuteRequest {
    pub fn new(path: ObjectPath) -> Self {
        Self {
            path,
            arguments: None,
        }
    }
}

impl ObserveRequest {
    pub fn new(path: ObjectPath) -> Self {
        Self { path }
    }
}

impl DiscoverRequest {
    pub fn new(path: ObjectPath) -> Self {
        Self { path }
    }
}

/// Any request the registry can forward to a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceRequest {
    Read(ReadRequest),
    Write(WriteRequest),
    WriteAttributes(WriteAttributesRequest),
    Execute(ExecuteRequest),
    Observe(ObserveRequest),
    Discover(DiscoverRequest),
}

impl DeviceRequest {
    /// Short operation name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            DeviceRequest::Read(_) => "read",
            DeviceRequest::Write(_) => "write",
            DeviceRequest::WriteAttributes(_) => "write_attributes",
            DeviceRequest::Execute(_) => "execute",
            DeviceRequest::Observe(_) => "observe",
            DeviceRequest::Discover(_) => "discover",
        }
    }

    pub fn path(&self) -> ObjectPath {
        match self {
            DeviceRequest::Read(r) => r.path,
            DeviceRequest::Write(r) => r.path,
            DeviceRequest::WriteAttributes(r) => r.path,
            DeviceRequest::Execute(r) => r.path,
            DeviceRequest::Observe(r) => r.path,
            DeviceRequest::Discover(r) => r.path,
        }
    }
}

/// Outcome code reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCode {
    Content,
    Changed,
    BadRequest,
    Unauthorized,
    NotFound,
    MethodNotAllowed,
    InternalServerError,
}

impl ResponseCode {
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseCode::Content | ResponseCode::Changed)
    }
}

/// Response returned by the device for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceResponse {
    pub code: ResponseCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
}

impl DeviceResponse {
    pub fn content(value: serde_json::Value) -> Self {
        Self {
            code: ResponseCode::Content,
            content: Some(value),
        }
    }

    pub fn changed() -> Self {
        Self {
            code: ResponseCode::Changed,
            content: None,
        }
    }

    pub fn error(code: ResponseCode) -> Self {
        Self {
            code,
            content: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_kind_and_path() {
        let request = DeviceRequest::Execute(ExecuteRequest::new(ObjectPath::resource(3, 0, 4)));
        assert_eq!(request.kind(), "execute");
        assert_eq!(request.path(), ObjectPath::resource(3, 0, 4));
    }

    #[test]
    fn test_request_serialization_is_tagged() {
        let request = DeviceRequest::Read(ReadRequest::new(ObjectPath::instance(3, 0)));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["kind"], "read");
        assert_eq!(json["path"]["object_id"], 3);
    }

    #[test]
    fn test_response_codes() {
        assert!(DeviceResponse::changed().code.is_success());
        assert!(!DeviceResponse::error(ResponseCode::NotFound).code.is_success());
    }
}
