use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Editable event fields, shared by the create and update requests
#[derive(Debug, Clone, Deserialize)]
pub struct EventFields {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// A user reference resolved to its display identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRef {
    pub id: String,
    pub username: String,
}

/// Fully resolved event snapshot returned to clients and carried in
/// notifications, so receivers never need a follow-up fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub creator: UserRef,
    pub attendees: Vec<UserRef>,
    pub created_at: DateTime<Utc>,
}

impl EventResponse {
    pub fn attendee_count(&self) -> usize {
        self.attendees.len()
    }
}

/// Outcome of a join/unjoin mutation: the updated snapshot plus the acting
/// user's display name (needed by attendee notifications; after an unjoin
/// the actor is no longer in the snapshot's attendee list)
#[derive(Debug, Clone)]
pub struct MembershipChange {
    pub event: EventResponse,
    pub username: String,
}
