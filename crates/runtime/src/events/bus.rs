//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{OutcomeEvent, RoundEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Round lifecycle (opened, submissions, resolution reports)
    Round,
    /// Termination and reward settlement
    Outcome,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Round(RoundEvent),
    Outcome(OutcomeEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Round(_) => Topic::Round,
            Event::Outcome(_) => Topic::Outcome,
        }
    }
}

/// Topic-based event bus
///
/// The topic set is fixed, so every channel exists from construction and
/// publishing never contends on a lock. Cloning shares the channels.
#[derive(Clone)]
pub struct EventBus {
    round: broadcast::Sender<Event>,
    outcome: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            round: broadcast::channel(capacity).0,
            outcome: broadcast::channel(capacity).0,
        }
    }

    fn channel(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Round => &self.round,
            Topic::Outcome => &self.outcome,
        }
    }

    /// Publish an event to its corresponding topic
    ///
    /// Events are best-effort: with no subscribers the event is dropped.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channel(topic).send(event).is_err() {
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channel(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
