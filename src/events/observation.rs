//! Observed value changes as per-path topic events

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

use super::{Event, EventPayload, EventSink};
use crate::models::ObjectPath;
use crate::registry::Registry;

/// An active observation of one node on one registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub registration_id: String,
    pub path: ObjectPath,
}

impl Observation {
    pub fn new(registration_id: impl Into<String>, path: ObjectPath) -> Self {
        Self {
            registration_id: registration_id.into(),
            path,
        }
    }
}

/// Posts observed values under `endpoint/objectId[/instanceId[/resourceId]]`
pub struct ObservationPublisher {
    registry: Arc<Registry>,
    sink: Arc<dyn EventSink>,
}

impl ObservationPublisher {
    pub fn new(registry: Arc<Registry>, sink: Arc<dyn EventSink>) -> Self {
        Self { registry, sink }
    }

    /// Topic for a value observed on `endpoint_name`
    pub fn topic(endpoint_name: &str, path: &ObjectPath) -> String {
        format!("{}/{}", endpoint_name, path.topic_suffix())
    }

    /// Post a new value. Returns `false` when the registration is no longer
    /// active and the value was dropped.
    pub fn new_value(&self, observation: &Observation, node: serde_json::Value) -> bool {
        let Some(client) = self
            .registry
            .find_by_registration_id(&observation.registration_id)
        else {
            trace!(
                "Dropped value for {}: registration {} is not active",
                observation.path,
                observation.registration_id
            );
            return false;
        };

        let topic = Self::topic(&client.endpoint_name, &observation.path);
        trace!("Received new value for observation from {}", client.endpoint_name);
        self.sink.post(Event::new(
            topic,
            EventPayload::Observation {
                client,
                path: observation.path,
                node,
            },
        ));
        true
    }

    pub fn cancelled(&self, observation: &Observation) {
        trace!(
            "Observation of {} on {} cancelled",
            observation.path,
            observation.registration_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BroadcastEventSink;
    use crate::models::EndpointRecord;
    use crate::registry::ManualClock;
    use std::net::{IpAddr, Ipv4Addr};

    fn setup() -> (Arc<Registry>, Arc<BroadcastEventSink>, ObservationPublisher) {
        let registry = Arc::new(Registry::new(Arc::new(ManualClock::default())));
        let sink = Arc::new(BroadcastEventSink::new(16));
        let publisher = ObservationPublisher::new(Arc::clone(&registry), sink.clone());
        (registry, sink, publisher)
    }

    #[test]
    fn test_topic_shape() {
        assert_eq!(ObservationPublisher::topic("dev-1", &ObjectPath::object(3)), "dev-1/3");
        assert_eq!(
            ObservationPublisher::topic("dev-1", &ObjectPath::instance(3, 0)),
            "dev-1/3/0"
        );
        assert_eq!(
            ObservationPublisher::topic("dev-1", &ObjectPath::resource(3, 0, 9)),
            "dev-1/3/0/9"
        );
    }

    #[tokio::test]
    async fn test_value_is_posted_for_active_registration() {
        let (registry, sink, publisher) = setup();
        let mut events = sink.subscribe();
        registry
            .register(
                EndpointRecord::builder("r1", "dev-1", IpAddr::V4(Ipv4Addr::LOCALHOST), 5683)
                    .build(),
            )
            .unwrap();

        let observation = Observation::new("r1", ObjectPath::resource(3, 0, 9));
        assert!(publisher.new_value(&observation, serde_json::json!(42)));

        let event = events.recv().await.unwrap();
        assert_eq!(event.topic, "dev-1/3/0/9");
        match event.payload {
            EventPayload::Observation { client, path, node } => {
                assert_eq!(client.registration_id, "r1");
                assert_eq!(path, ObjectPath::resource(3, 0, 9));
                assert_eq!(node, serde_json::json!(42));
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_value_for_unknown_registration_is_dropped() {
        let (_registry, sink, publisher) = setup();
        let mut events = sink.subscribe();

        let observation = Observation::new("gone", ObjectPath::object(3));
        assert!(!publisher.new_value(&observation, serde_json::json!(1)));
        assert!(events.try_recv().is_err());
    }
}
