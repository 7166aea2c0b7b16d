//! WebSocket handler for the per-user realtime event channel.
//!
//! Provides `/api/events/ws?token=<jwt>`. The token is verified before the
//! upgrade; after that the connection only receives events for that user.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::auth::extractor::claims_to_user;
use crate::error::ApiError;
use crate::models::event::UserEvent;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// Client-to-server control message
#[derive(Debug, Clone, Deserialize)]
pub struct WsRequest {
    /// `ping` or `unsubscribe`
    pub action: String,
}

/// Server-to-client message
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum WsMessage {
    #[serde(rename = "subscribed")]
    Subscribed { user_id: i32 },
    #[serde(rename = "event")]
    Event(UserEvent),
    #[serde(rename = "pong")]
    Pong,
}

pub async fn events_websocket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = claims_to_user(&state, &query.token)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user.user_id)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: i32) {
    let (mut sender, mut receiver) = socket.split();

    info!("events WebSocket connected for user {}", user_id);

    let _ = sender
        .send(Message::Text(
            serde_json::to_string(&WsMessage::Subscribed { user_id })
                .unwrap()
                .into(),
        ))
        .await;

    let mut broadcast_rx = state.broadcaster.subscribe();

    // Heartbeat interval
    let mut heartbeat = tokio::time::interval(Duration::from_secs(30));

    loop {
        tokio::select! {
            result = broadcast_rx.recv() => {
                match result {
                    Ok(event) => {
                        // Only forward events on this user's channel
                        if event.user_id == user_id {
                            let msg = WsMessage::Event(event);
                            if let Err(e) = sender.send(Message::Text(
                                serde_json::to_string(&msg).unwrap().into()
                            )).await {
                                debug!("WebSocket send error: {}", e);
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("user {} missed {} events", user_id, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("event channel closed");
                        break;
                    }
                }
            }

            _ = heartbeat.tick() => {
                if let Err(e) = sender.send(Message::Ping(axum::body::Bytes::new())).await {
                    debug!("heartbeat failed: {}", e);
                    break;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(req) = serde_json::from_str::<WsRequest>(&text) {
                            match req.action.as_str() {
                                "ping" => {
                                    let _ = sender.send(Message::Text(
                                        serde_json::to_string(&WsMessage::Pong).unwrap().into()
                                    )).await;
                                }
                                "unsubscribe" => {
                                    info!("user {} unsubscribed", user_id);
                                    break;
                                }
                                _ => {}
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket closed by client");
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket receive error: {}", e);
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("events WebSocket closed for user {}", user_id);
}
