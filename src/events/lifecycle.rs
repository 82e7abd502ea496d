//! Lifecycle callbacks as sink events

use std::sync::Arc;

use super::{Event, EventPayload, EventSink};
use crate::models::{EndpointRecord, RegistrationUpdate};
use crate::registry::RegistryListener;

pub const CLIENT_REGISTERED: &str = "CLIENT_REGISTERED";
pub const CLIENT_UPDATED: &str = "CLIENT_UPDATED";
pub const CLIENT_UNREGISTERED: &str = "CLIENT_UNREGISTERED";

/// Registry listener posting one event per lifecycle transition
pub struct LifecycleEventPublisher {
    sink: Arc<dyn EventSink>,
}

impl LifecycleEventPublisher {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    fn post(&self, topic: &str, record: &EndpointRecord) {
        self.sink.post(Event::new(
            topic,
            EventPayload::Lifecycle {
                client: record.clone(),
            },
        ));
    }
}

impl RegistryListener for LifecycleEventPublisher {
    fn registered(&self, record: &EndpointRecord) {
        self.post(CLIENT_REGISTERED, record);
    }

    fn updated(&self, _update: &RegistrationUpdate, record: &EndpointRecord) {
        self.post(CLIENT_UPDATED, record);
    }

    fn unregistered(&self, record: &EndpointRecord) {
        self.post(CLIENT_UNREGISTERED, record);
    }
}
