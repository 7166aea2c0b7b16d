//! Broadcast channel for realtime user events.
//!
//! Constructor-injected and held in `AppState`; WebSocket connections
//! subscribe and filter by user id.

use tokio::sync::broadcast;

use crate::models::event::UserEvent;

#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<UserEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1000);
        Self { tx }
    }

    /// Broadcast an event to all subscribers. Lossy when nobody listens.
    pub fn broadcast(&self, event: UserEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UserEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
