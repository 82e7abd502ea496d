//! Event sink abstraction and the broadcast-channel implementation

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::models::{EndpointRecord, ObjectPath};

/// Event body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Registration lifecycle transition
    Lifecycle { client: EndpointRecord },
    /// New value of an observed node
    Observation {
        client: EndpointRecord,
        path: ObjectPath,
        node: serde_json::Value,
    },
}

/// A topic-addressed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub topic: String,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(topic: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// The endpoint the event is about
    pub fn client(&self) -> &EndpointRecord {
        match &self.payload {
            EventPayload::Lifecycle { client } => client,
            EventPayload::Observation { client, .. } => client,
        }
    }
}

/// Fire-and-forget event delivery.
///
/// `post` must not block; delivery to consumers is asynchronous.
pub trait EventSink: Send + Sync {
    fn post(&self, event: Event);
}

/// Sink fanning events out over a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<Event>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventSink for BroadcastEventSink {
    fn post(&self, event: Event) {
        let topic = event.topic.clone();
        match self.sender.send(event) {
            Ok(receivers) => trace!("Posted event to {} ({} receivers)", topic, receivers),
            Err(_) => trace!("Dropped event to {}: no subscribers", topic),
        }
    }
}
