//! Event bus for overlay observers using tokio::broadcast
//!
//! Lets external surfaces (debug panels, tests) follow what the engine is
//! doing without reaching into its state.

use crate::dom::NodeId;
use tokio::sync::broadcast;

/// Events emitted by the overlay engine
#[derive(Debug, Clone)]
pub enum OverlayEvent {
    /// A trigger was absorbed or fired; recomputation is imminent
    RecomputeScheduled,
    /// A full board pass finished; carries the number of lists summed
    RecomputeCompleted { lists: usize },
    /// A card title was flagged as mutated
    CardMutated(NodeId),
    /// The picker affordance was shown
    PickerShown,
    /// A picker value was applied and committed
    PickerApplied,
}

/// Broadcast bus for overlay events
pub struct EventBus {
    sender: broadcast::Sender<OverlayEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (256 events)
    pub fn default_capacity() -> Self {
        Self::new(256)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: OverlayEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<OverlayEvent> {
        self.sender.subscribe()
    }

    /// Get current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
