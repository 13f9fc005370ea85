use serde::{Deserialize, Serialize};

/// Client -> Server message types
///
/// The live protocol is deliberately tiny: connections only manage their
/// room subscriptions. All mutations go through the HTTP API; the five
/// server-to-client notification kinds live in `broadcast::Notification`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessageType {
    JoinEventRoom,
    LeaveEventRoom,
}

/// Message sent by a connected client to manage its room subscriptions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub message_type: ClientMessageType,
    pub event_id: String,
}

impl ClientMessage {
    pub fn join(event_id: impl Into<String>) -> Self {
        Self {
            message_type: ClientMessageType::JoinEventRoom,
            event_id: event_id.into(),
        }
    }

    pub fn leave(event_id: impl Into<String>) -> Self {
        Self {
            message_type: ClientMessageType::LeaveEventRoom,
            event_id: event_id.into(),
        }
    }
}
