use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::Event;

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for change events, one channel per watched entity id.
pub struct NotifyHub {
    channels: DashMap<Ulid, broadcast::Sender<Event>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to changes touching `topic` (a user, project, task or booking id).
    /// Creates the channel if needed.
    pub fn subscribe(&self, topic: Ulid) -> broadcast::Receiver<Event> {
        let sender = self
            .channels
            .entry(topic)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send to a single topic. No-op if nobody is listening; a channel whose receivers have
    /// all been dropped is discarded.
    pub fn send(&self, topic: Ulid, event: &Event) {
        let delivered = match self.channels.get(&topic) {
            Some(sender) => sender.send(event.clone()).is_ok(),
            None => return,
        };
        if !delivered {
            self.channels.remove_if(&topic, |_, sender| sender.receiver_count() == 0);
        }
    }

    /// Number of live topic channels.
    pub fn topic_count(&self) -> usize {
        self.channels.len()
    }

    /// Send to every topic the event touches.
    pub fn publish(&self, event: &Event) {
        if self.channels.is_empty() {
            return;
        }
        for topic in event.topics() {
            self.send(topic, event);
        }
    }

    /// Drop a topic's channel, e.g. after the entity is removed. Open receivers see `Closed`.
    pub fn remove(&self, topic: &Ulid) {
        self.channels.remove(topic);
    }
}
