use std::sync::Arc;
use tracing::{debug, warn};

use super::notifications::{Notification, Route};
use crate::registry::RoomRegistry;

/// Stateless translation layer between mutation outcomes and the registry
///
/// Publishing is fire-and-forget: the mutation has already committed by the
/// time a notification exists, so nothing here can fail the request.
/// Serialization problems are logged and swallowed.
pub struct EventBroadcaster {
    registry: Arc<RoomRegistry>,
}

impl EventBroadcaster {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    pub async fn publish(&self, notification: Notification) {
        let message = match serde_json::to_string(&notification) {
            Ok(message) => message,
            Err(e) => {
                warn!(
                    kind = notification.kind(),
                    error = %e,
                    "Failed to serialize notification, dropping it"
                );
                return;
            }
        };

        match notification.route() {
            Route::Global => {
                debug!(kind = notification.kind(), "Publishing global notification");
                self.registry.broadcast_global(&message).await;
            }
            Route::Room(room_key) => {
                debug!(
                    kind = notification.kind(),
                    room_key = %room_key,
                    "Publishing room notification"
                );
                self.registry.broadcast(room_key, &message).await;
            }
        }
    }
}
