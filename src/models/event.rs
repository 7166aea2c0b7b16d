//! Realtime events pushed over the per-user WebSocket channel.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "token-created")]
    TokenCreated,
    #[serde(rename = "transaction-updated")]
    TransactionUpdated,
    #[serde(rename = "gasless-transaction-sponsored")]
    GaslessTransactionSponsored,
}

/// Event on a user-scoped logical channel. `user_id` is used for routing
/// and is not serialized to the client.
#[derive(Debug, Clone, Serialize)]
pub struct UserEvent {
    #[serde(skip_serializing)]
    pub user_id: i32,
    pub event: EventKind,
    pub payload: serde_json::Value,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl UserEvent {
    pub fn new(user_id: i32, event: EventKind, payload: serde_json::Value) -> Self {
        Self {
            user_id,
            event,
            payload,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}
