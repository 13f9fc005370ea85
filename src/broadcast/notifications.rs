use serde::{Deserialize, Serialize};

use crate::events::EventResponse;

/// Where a notification is delivered
#[derive(Debug, PartialEq)]
pub enum Route<'a> {
    /// Every live session (dashboard viewers are not yet in any room)
    Global,
    /// Only sessions subscribed to this event's room
    Room(&'a str),
}

/// The closed set of live notifications
///
/// Each state-carrying variant embeds a fully resolved event snapshot so
/// receivers can render without a follow-up fetch. Receivers dispatch
/// exhaustively on the tag instead of inspecting payload shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    NewEvent {
        event: EventResponse,
    },
    EventUpdated {
        event: EventResponse,
    },
    EventDeleted {
        event_id: String,
    },
    AttendeeJoined {
        event: EventResponse,
        attendee_count: usize,
        joining_user: String,
    },
    AttendeeLeft {
        event: EventResponse,
        attendee_count: usize,
        leaving_user: String,
    },
}

impl Notification {
    pub fn attendee_joined(event: EventResponse, joining_user: String) -> Self {
        let attendee_count = event.attendee_count();
        Self::AttendeeJoined {
            event,
            attendee_count,
            joining_user,
        }
    }

    pub fn attendee_left(event: EventResponse, leaving_user: String) -> Self {
        let attendee_count = event.attendee_count();
        Self::AttendeeLeft {
            event,
            attendee_count,
            leaving_user,
        }
    }

    /// Creation and deletion go to everyone; the rest is room-scoped
    pub fn route(&self) -> Route<'_> {
        match self {
            Notification::NewEvent { .. } | Notification::EventDeleted { .. } => Route::Global,
            Notification::EventUpdated { event }
            | Notification::AttendeeJoined { event, .. }
            | Notification::AttendeeLeft { event, .. } => Route::Room(&event.id),
        }
    }

    /// Tag name, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::NewEvent { .. } => "new_event",
            Notification::EventUpdated { .. } => "event_updated",
            Notification::EventDeleted { .. } => "event_deleted",
            Notification::AttendeeJoined { .. } => "attendee_joined",
            Notification::AttendeeLeft { .. } => "attendee_left",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::UserRef;
    use chrono::Utc;

    fn snapshot(event_id: &str, attendees: usize) -> EventResponse {
        let now = Utc::now();
        EventResponse {
            id: event_id.to_string(),
            title: "Picnic".to_string(),
            description: "In the park".to_string(),
            location: None,
            start_date: now,
            end_date: now,
            creator: UserRef {
                id: "u1".to_string(),
                username: "alice".to_string(),
            },
            attendees: (0..attendees)
                .map(|i| UserRef {
                    id: format!("u{}", i + 2),
                    username: format!("user-{}", i),
                })
                .collect(),
            created_at: now,
        }
    }

    #[test]
    fn test_routing_table() {
        assert_eq!(
            Notification::NewEvent {
                event: snapshot("e1", 0)
            }
            .route(),
            Route::Global
        );
        assert_eq!(
            Notification::EventDeleted {
                event_id: "e1".to_string()
            }
            .route(),
            Route::Global
        );
        assert_eq!(
            Notification::EventUpdated {
                event: snapshot("e1", 0)
            }
            .route(),
            Route::Room("e1")
        );
        assert_eq!(
            Notification::attendee_joined(snapshot("e1", 1), "bob".to_string()).route(),
            Route::Room("e1")
        );
        assert_eq!(
            Notification::attendee_left(snapshot("e1", 0), "bob".to_string()).route(),
            Route::Room("e1")
        );
    }

    #[test]
    fn test_attendee_count_derived_from_snapshot() {
        let n = Notification::attendee_joined(snapshot("e1", 3), "bob".to_string());
        match n {
            Notification::AttendeeJoined { attendee_count, .. } => assert_eq!(attendee_count, 3),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_wire_format_is_tagged() {
        let n = Notification::EventDeleted {
            event_id: "e1".to_string(),
        };
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains(r#""type":"EVENT_DELETED""#));
        assert!(json.contains(r#""event_id":"e1""#));

        let back: Notification = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, Notification::EventDeleted { .. }));
    }
}
