use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, instrument};

/// Everything the registry tracks, behind one lock so room membership and
/// the session table can never disagree
#[derive(Default)]
struct RegistryInner {
    /// session_id -> outbound channel to that connection
    sessions: HashMap<String, mpsc::UnboundedSender<String>>,
    /// room key (event id) -> subscribed session ids
    rooms: HashMap<String, HashSet<String>>,
    /// session_id -> room keys it has joined, for cleanup on disconnect
    session_rooms: HashMap<String, HashSet<String>>,
}

/// Room-scoped fan-out for live connections
///
/// Pure delivery mechanism: no business logic, no persistence. Constructed
/// once at startup and injected wherever broadcasts originate. Room
/// subscription is independent of event attendance; a connection may watch
/// an event it is not attending and vice versa.
///
/// Delivery is best-effort: a session whose channel is closed is skipped,
/// never retried, and a miss never surfaces to the caller.
pub struct RoomRegistry {
    inner: RwLock<RegistryInner>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Registers a newly connected session and its outbound channel
    #[instrument(skip(self, sender))]
    pub async fn register_session(&self, session_id: String, sender: mpsc::UnboundedSender<String>) {
        let mut inner = self.inner.write().await;
        inner.session_rooms.entry(session_id.clone()).or_default();
        inner.sessions.insert(session_id.clone(), sender);
        debug!(session_id = %session_id, "Session registered");
    }

    /// Adds a session to a room; idempotent, no-op if already joined
    #[instrument(skip(self))]
    pub async fn join_room(&self, session_id: &str, room_key: &str) {
        let mut inner = self.inner.write().await;
        if !inner.sessions.contains_key(session_id) {
            debug!(session_id = %session_id, "Ignoring room join for unknown session");
            return;
        }

        inner
            .rooms
            .entry(room_key.to_string())
            .or_default()
            .insert(session_id.to_string());
        inner
            .session_rooms
            .entry(session_id.to_string())
            .or_default()
            .insert(room_key.to_string());

        debug!(session_id = %session_id, room_key = %room_key, "Session joined room");
    }

    /// Removes a session from a room; idempotent inverse of join_room.
    /// Empty rooms are left in place, a broadcast to one is a no-op.
    #[instrument(skip(self))]
    pub async fn leave_room(&self, session_id: &str, room_key: &str) {
        let mut inner = self.inner.write().await;
        if let Some(subscribers) = inner.rooms.get_mut(room_key) {
            subscribers.remove(session_id);
        }
        if let Some(joined) = inner.session_rooms.get_mut(session_id) {
            joined.remove(room_key);
        }
        debug!(session_id = %session_id, room_key = %room_key, "Session left room");
    }

    /// Delivers a message to every current subscriber of a room
    #[instrument(skip(self, message))]
    pub async fn broadcast(&self, room_key: &str, message: &str) {
        let inner = self.inner.read().await;
        let Some(subscribers) = inner.rooms.get(room_key) else {
            debug!(room_key = %room_key, "Broadcast to unknown room is a no-op");
            return;
        };

        let mut delivered = 0usize;
        for session_id in subscribers {
            if let Some(sender) = inner.sessions.get(session_id) {
                // A closed receiver means the connection is going away;
                // drop_session will clean it up
                if sender.send(message.to_string()).is_ok() {
                    delivered += 1;
                }
            }
        }

        debug!(
            room_key = %room_key,
            subscribers = subscribers.len(),
            delivered = delivered,
            "Room broadcast"
        );
    }

    /// Delivers a message to every live session regardless of rooms
    #[instrument(skip(self, message))]
    pub async fn broadcast_global(&self, message: &str) {
        let inner = self.inner.read().await;

        let mut delivered = 0usize;
        for sender in inner.sessions.values() {
            if sender.send(message.to_string()).is_ok() {
                delivered += 1;
            }
        }

        debug!(
            sessions = inner.sessions.len(),
            delivered = delivered,
            "Global broadcast"
        );
    }

    /// Removes a session from every room it joined; called exactly once on
    /// disconnect so no room ever references a dead session
    #[instrument(skip(self))]
    pub async fn drop_session(&self, session_id: &str) {
        let mut inner = self.inner.write().await;

        if let Some(joined) = inner.session_rooms.remove(session_id) {
            for room_key in joined {
                if let Some(subscribers) = inner.rooms.get_mut(&room_key) {
                    subscribers.remove(session_id);
                }
            }
        }
        inner.sessions.remove(session_id);

        debug!(session_id = %session_id, "Session dropped");
    }

    /// Number of sessions currently subscribed to a room
    pub async fn room_size(&self, room_key: &str) -> usize {
        let inner = self.inner.read().await;
        inner.rooms.get(room_key).map(|s| s.len()).unwrap_or(0)
    }

    /// Number of live sessions
    pub async fn session_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.sessions.len()
    }
}
