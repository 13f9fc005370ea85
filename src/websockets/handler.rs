use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::registry::RoomRegistry;
use crate::shared::AppState;
use crate::websockets::messages::{ClientMessage, ClientMessageType};

use super::socket::{Connection, MessageHandler};

/// Handles room join/leave requests arriving over a live connection
///
/// This is the only inbound surface of the live protocol; everything else
/// is server-to-client.
pub struct RoomMessageHandler {
    registry: Arc<RoomRegistry>,
}

impl RoomMessageHandler {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl MessageHandler for RoomMessageHandler {
    async fn handle_message(&self, session_id: &str, message: String) {
        match serde_json::from_str::<ClientMessage>(&message) {
            Ok(client_message) => match client_message.message_type {
                ClientMessageType::JoinEventRoom => {
                    debug!(
                        session_id = %session_id,
                        event_id = %client_message.event_id,
                        "Session subscribing to event room"
                    );
                    self.registry
                        .join_room(session_id, &client_message.event_id)
                        .await;
                }
                ClientMessageType::LeaveEventRoom => {
                    debug!(
                        session_id = %session_id,
                        event_id = %client_message.event_id,
                        "Session unsubscribing from event room"
                    );
                    self.registry
                        .leave_room(session_id, &client_message.event_id)
                        .await;
                }
            },
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to parse client message"
                );
            }
        }
    }
}

/// WebSocket endpoint for live updates
///
/// GET /ws - no authentication; watching an event is as public as listing
/// them, and the connection carries no mutations
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, app_state))
}

/// Handle the upgraded WebSocket connection for its whole lifetime
async fn handle_websocket_connection(socket: axum::extract::ws::WebSocket, app_state: AppState) {
    // A reconnecting client gets a brand-new session and re-joins its rooms
    let session_id = Uuid::new_v4().to_string();

    info!(session_id = %session_id, "WebSocket connection established");

    // Outbound channel (registry -> this client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    app_state
        .registry
        .register_session(session_id.clone(), outbound_sender)
        .await;

    let message_handler = Arc::new(RoomMessageHandler::new(app_state.registry.clone()));

    let connection = Connection::new(
        session_id.clone(),
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => {
            info!(session_id = %session_id, "WebSocket connection closed cleanly");
        }
        Err(e) => {
            warn!(
                session_id = %session_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }

    // Terminal transition: every joined room must be left
    app_state.registry.drop_session(&session_id).await;

    info!(session_id = %session_id, "Session cleaned up after disconnect");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_and_leave_via_messages() {
        let registry = Arc::new(RoomRegistry::new());
        let handler = RoomMessageHandler::new(registry.clone());

        let (tx, _rx) = mpsc::unbounded_channel();
        registry.register_session("s1".to_string(), tx).await;

        let join = serde_json::to_string(&ClientMessage::join("event-1")).unwrap();
        handler.handle_message("s1", join).await;
        assert_eq!(registry.room_size("event-1").await, 1);

        let leave = serde_json::to_string(&ClientMessage::leave("event-1")).unwrap();
        handler.handle_message("s1", leave).await;
        assert_eq!(registry.room_size("event-1").await, 0);
    }

    #[tokio::test]
    async fn test_malformed_message_is_ignored() {
        let registry = Arc::new(RoomRegistry::new());
        let handler = RoomMessageHandler::new(registry.clone());

        let (tx, _rx) = mpsc::unbounded_channel();
        registry.register_session("s1".to_string(), tx).await;

        handler.handle_message("s1", "not json at all".to_string()).await;
        handler
            .handle_message("s1", r#"{"type": "UNKNOWN", "event_id": "e1"}"#.to_string())
            .await;

        assert_eq!(registry.room_size("e1").await, 0);
        assert_eq!(registry.session_count().await, 1);
    }
}
