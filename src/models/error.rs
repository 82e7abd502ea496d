//! Error types for the endpoint registry

use thiserror::Error;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Registration id {registration_id} is already active for endpoint {endpoint_name}")]
    DuplicateRegistrationId {
        registration_id: String,
        endpoint_name: String,
    },

    #[error("Endpoint mismatch: record for {existing} cannot be replaced by a record for {replacement}")]
    EndpointMismatch { existing: String, replacement: String },

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request to {endpoint_name} timed out after {timeout_ms} ms")]
    Timeout { endpoint_name: String, timeout_ms: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RegistryError {
    pub fn validation(message: impl Into<String>) -> Self {
        RegistryError::Validation(message.into())
    }

    pub fn duplicate_registration_id(
        registration_id: impl Into<String>,
        endpoint_name: impl Into<String>,
    ) -> Self {
        RegistryError::DuplicateRegistrationId {
            registration_id: registration_id.into(),
            endpoint_name: endpoint_name.into(),
        }
    }

    pub fn endpoint_mismatch(existing: impl Into<String>, replacement: impl Into<String>) -> Self {
        RegistryError::EndpointMismatch {
            existing: existing.into(),
            replacement: replacement.into(),
        }
    }

    pub fn timeout(endpoint_name: impl Into<String>, timeout_ms: u64) -> Self {
        RegistryError::Timeout {
            endpoint_name: endpoint_name.into(),
            timeout_ms,
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for RegistryError {
    fn from(err: config::ConfigError) -> Self {
        RegistryError::Config(err.to_string())
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
