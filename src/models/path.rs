//! Object/resource path addressing within a device

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::RegistryError;

/// Path to an object, object instance, or resource: `/object[/instance[/resource]]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectPath {
    pub object_id: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<u16>,
}

impl ObjectPath {
    pub fn object(object_id: u16) -> Self {
        Self {
            object_id,
            instance_id: None,
            resource_id: None,
        }
    }

    pub fn instance(object_id: u16, instance_id: u16) -> Self {
        Self {
            object_id,
            instance_id: Some(instance_id),
            resource_id: None,
        }
    }

    pub fn resource(object_id: u16, instance_id: u16, resource_id: u16) -> Self {
        Self {
            object_id,
            instance_id: Some(instance_id),
            resource_id: Some(resource_id),
        }
    }

    /// Topic segments below the endpoint name, e.g. `3/0/9`.
    ///
    /// A resource id is only included when an instance id is present.
    pub fn topic_suffix(&self) -> String {
        let mut suffix = self.object_id.to_string();
        if let Some(instance_id) = self.instance_id {
            suffix.push('/');
            suffix.push_str(&instance_id.to_string());
            if let Some(resource_id) = self.resource_id {
                suffix.push('/');
                suffix.push_str(&resource_id.to_string());
            }
        }
        suffix
    }
}

impl std::fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.topic_suffix())
    }
}

impl FromStr for ObjectPath {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegistryError::validation(format!("Invalid object path: {}", s));

        let ids = s
            .trim_start_matches('/')
            .split('/')
            .map(|segment| segment.parse::<u16>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        match ids.as_slice() {
            [object] => Ok(ObjectPath::object(*object)),
            [object, instance] => Ok(ObjectPath::instance(*object, *instance)),
            [object, instance, resource] => Ok(ObjectPath::resource(*object, *instance, *resource)),
            _ => Err(invalid()),
        }
    }
}
