//! Event bus for domain events derived by the cache lists.

use simplecloud_types::CloudEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Default number of buffered events per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// An event together with where the change came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEnvelope {
    /// List that derived the event.
    pub list_name: String,
    /// True if the change was replayed from a received packet. Listeners
    /// that react by mutating cache lists must not re-broadcast these.
    pub from_packet: bool,
    pub event: CloudEvent,
}

/// Fan-out bus for [`EventEnvelope`]s.
///
/// Subscribers that fall behind by more than the capacity lose the oldest
/// events (`RecvError::Lagged`); publishing never blocks.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event. Returns the number of subscribers that received it.
    pub fn publish(&self, envelope: EventEnvelope) -> usize {
        trace!(
            "Publishing {} from {} (from_packet={})",
            envelope.event.name(),
            envelope.list_name,
            envelope.from_packet
        );
        // No subscribers is fine: events are fire-and-forget.
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribes to all events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Current number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
