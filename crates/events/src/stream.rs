//! Secondary, best-effort event stream (spec §4.4 "Stream channel").
//!
//! A fire-and-forget projection of the same [`ExecutionEvent`]s the broker
//! delivers, backed by `tokio::sync::broadcast` -- acceptable to drop under
//! backpressure, unlike the ordered, must-deliver [`crate::ExecutionBroker`]
//! path.

use tokio::sync::broadcast;

use crate::event::ExecutionEvent;

/// A handle for publishing onto the stream channel.
#[derive(Clone)]
pub struct EventStream {
    sender: broadcast::Sender<ExecutionEvent>,
}

impl EventStream {
    /// Create a stream with the given channel capacity
    /// (`engine_config::EngineDefaults::stream_channel_capacity`).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to the stream. Lagging subscribers silently miss events
    /// rather than blocking the publisher.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. A send with no active subscribers is not an error.
    pub fn publish(&self, event: ExecutionEvent) {
        let _ = self.sender.send(event);
    }
}
