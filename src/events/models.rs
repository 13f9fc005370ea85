use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::types::EventFields;

/// Database model for events table
///
/// `attendee_ids` preserves insertion order for display; uniqueness is
/// enforced by the repository's conditional add.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EventModel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub creator_id: String,
    pub attendee_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl EventModel {
    /// Creates a new event model with a generated id and empty attendee set
    pub fn new(creator_id: String, fields: EventFields) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: fields.title,
            description: fields.description,
            location: fields.location,
            start_date: fields.start_date,
            end_date: fields.end_date,
            creator_id,
            attendee_ids: vec![],
            created_at: Utc::now(),
        }
    }

    /// Check whether a user is in the attendee set
    pub fn has_attendee(&self, user_id: &str) -> bool {
        self.attendee_ids.iter().any(|id| id == user_id)
    }

    pub fn attendee_count(&self) -> usize {
        self.attendee_ids.len()
    }
}
