use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::models::EventModel;
use crate::shared::AppError;

/// Result of an atomic add-attendee attempt
#[derive(Debug, Clone)]
pub enum JoinAttemptResult {
    /// User appended to the attendee set, returns updated event
    Joined(EventModel),
    /// User was already in the attendee set
    AlreadyJoined,
    /// Event does not exist
    EventNotFound,
}

/// Result of an atomic remove-attendee attempt
#[derive(Debug, Clone)]
pub enum UnjoinAttemptResult {
    /// User removed from the attendee set, returns updated event
    Removed(EventModel),
    /// User was not in the attendee set
    NotJoined,
    /// Event does not exist
    EventNotFound,
}

/// Trait for event repository operations
///
/// `try_add_attendee` and `try_remove_attendee` are the linearization
/// points for membership: the check and the mutation happen as one guarded
/// step, never as a read-modify-write across calls.
#[async_trait]
pub trait EventRepository {
    async fn create_event(&self, event: &EventModel) -> Result<(), AppError>;
    async fn find_event(&self, event_id: &str) -> Result<Option<EventModel>, AppError>;

    /// All events, newest creation first
    async fn list_events(&self) -> Result<Vec<EventModel>, AppError>;

    /// Replaces the event's editable fields if it exists AND is owned by
    /// `editor_id`; returns None otherwise (ownership is indistinguishable
    /// from existence to the caller)
    async fn update_owned(
        &self,
        event: &EventModel,
        editor_id: &str,
    ) -> Result<Option<EventModel>, AppError>;

    /// Deletes the event if owned by `editor_id`; false when missing or
    /// owned by someone else
    async fn delete_owned(&self, event_id: &str, editor_id: &str) -> Result<bool, AppError>;

    /// Atomically appends a user to the attendee set if not already present
    async fn try_add_attendee(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<JoinAttemptResult, AppError>;

    /// Atomically removes a user from the attendee set if present
    async fn try_remove_attendee(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<UnjoinAttemptResult, AppError>;
}

/// In-memory implementation of EventRepository for development and testing
pub struct InMemoryEventRepository {
    events: Mutex<HashMap<String, EventModel>>,
}

impl Default for InMemoryEventRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of events (useful in tests)
    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    #[instrument(skip(self, event))]
    async fn create_event(&self, event: &EventModel) -> Result<(), AppError> {
        debug!(event_id = %event.id, title = %event.title, "Creating event in memory");

        let mut events = self.events.lock().unwrap();
        if events.contains_key(&event.id) {
            warn!(event_id = %event.id, "Event already exists in memory");
            return Err(AppError::DatabaseError("Event already exists".to_string()));
        }
        events.insert(event.id.clone(), event.clone());

        debug!(event_id = %event.id, "Event created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_event(&self, event_id: &str) -> Result<Option<EventModel>, AppError> {
        let events = self.events.lock().unwrap();
        Ok(events.get(event_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_events(&self) -> Result<Vec<EventModel>, AppError> {
        let events = self.events.lock().unwrap();
        let mut list: Vec<EventModel> = events.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    #[instrument(skip(self, event))]
    async fn update_owned(
        &self,
        event: &EventModel,
        editor_id: &str,
    ) -> Result<Option<EventModel>, AppError> {
        let mut events = self.events.lock().unwrap();

        let stored = match events.get_mut(&event.id) {
            Some(stored) if stored.creator_id == editor_id => stored,
            _ => {
                debug!(event_id = %event.id, "Event not found or not owned by editor");
                return Ok(None);
            }
        };

        stored.title = event.title.clone();
        stored.description = event.description.clone();
        stored.location = event.location.clone();
        stored.start_date = event.start_date;
        stored.end_date = event.end_date;

        debug!(event_id = %event.id, "Event updated in memory");
        Ok(Some(stored.clone()))
    }

    #[instrument(skip(self))]
    async fn delete_owned(&self, event_id: &str, editor_id: &str) -> Result<bool, AppError> {
        let mut events = self.events.lock().unwrap();

        let owned = events
            .get(event_id)
            .map(|e| e.creator_id == editor_id)
            .unwrap_or(false);
        if !owned {
            debug!(event_id = %event_id, "Event not found or not owned by editor");
            return Ok(false);
        }

        events.remove(event_id);
        info!(event_id = %event_id, "Event deleted from memory");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn try_add_attendee(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<JoinAttemptResult, AppError> {
        // Check and append under one lock so concurrent joins by the same
        // user resolve to exactly one success
        let mut events = self.events.lock().unwrap();

        let event = match events.get_mut(event_id) {
            Some(event) => event,
            None => {
                debug!(event_id = %event_id, "Event not found");
                return Ok(JoinAttemptResult::EventNotFound);
            }
        };

        if event.has_attendee(user_id) {
            debug!(event_id = %event_id, user_id = %user_id, "User already in attendee set");
            return Ok(JoinAttemptResult::AlreadyJoined);
        }

        event.attendee_ids.push(user_id.to_string());
        let updated = event.clone();

        info!(
            event_id = %event_id,
            user_id = %user_id,
            attendee_count = updated.attendee_count(),
            "Attendee added (atomic)"
        );
        Ok(JoinAttemptResult::Joined(updated))
    }

    #[instrument(skip(self))]
    async fn try_remove_attendee(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<UnjoinAttemptResult, AppError> {
        let mut events = self.events.lock().unwrap();

        let event = match events.get_mut(event_id) {
            Some(event) => event,
            None => {
                debug!(event_id = %event_id, "Event not found");
                return Ok(UnjoinAttemptResult::EventNotFound);
            }
        };

        if !event.has_attendee(user_id) {
            debug!(event_id = %event_id, user_id = %user_id, "User not in attendee set");
            return Ok(UnjoinAttemptResult::NotJoined);
        }

        event.attendee_ids.retain(|id| id != user_id);
        let updated = event.clone();

        info!(
            event_id = %event_id,
            user_id = %user_id,
            attendee_count = updated.attendee_count(),
            "Attendee removed (atomic)"
        );
        Ok(UnjoinAttemptResult::Removed(updated))
    }
}

/// PostgreSQL implementation of event repository
///
/// Membership mutations use a single conditional UPDATE so the presence
/// check and the array mutation are one atomic statement.
pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_event(row: &sqlx::postgres::PgRow) -> EventModel {
        EventModel {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            location: row.get("location"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            creator_id: row.get("creator_id"),
            attendee_ids: row.get("attendee_ids"),
            created_at: row.get("created_at"),
        }
    }
}

const EVENT_COLUMNS: &str =
    "id, title, description, location, start_date, end_date, creator_id, attendee_ids, created_at";

#[async_trait]
impl EventRepository for PostgresEventRepository {
    #[instrument(skip(self, event))]
    async fn create_event(&self, event: &EventModel) -> Result<(), AppError> {
        debug!(event_id = %event.id, "Creating event in database");

        sqlx::query(
            "INSERT INTO events (id, title, description, location, start_date, end_date, creator_id, attendee_ids, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.creator_id)
        .bind(&event.attendee_ids)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create event in database");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(event_id = %event.id, "Event created successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_event(&self, event_id: &str) -> Result<Option<EventModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, event_id = %event_id, "Failed to fetch event from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.as_ref().map(Self::row_to_event))
    }

    #[instrument(skip(self))]
    async fn list_events(&self) -> Result<Vec<EventModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list events from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(rows.iter().map(Self::row_to_event).collect())
    }

    #[instrument(skip(self, event))]
    async fn update_owned(
        &self,
        event: &EventModel,
        editor_id: &str,
    ) -> Result<Option<EventModel>, AppError> {
        let row = sqlx::query(&format!(
            "UPDATE events SET title = $3, description = $4, location = $5, start_date = $6, end_date = $7 \
             WHERE id = $1 AND creator_id = $2 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&event.id)
        .bind(editor_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.start_date)
        .bind(event.end_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, event_id = %event.id, "Failed to update event in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.as_ref().map(Self::row_to_event))
    }

    #[instrument(skip(self))]
    async fn delete_owned(&self, event_id: &str, editor_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND creator_id = $2")
            .bind(event_id)
            .bind(editor_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, event_id = %event_id, "Failed to delete event from database");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn try_add_attendee(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<JoinAttemptResult, AppError> {
        // Append-if-absent in one statement; the WHERE clause is the guard
        let row = sqlx::query(&format!(
            "UPDATE events SET attendee_ids = array_append(attendee_ids, $2) \
             WHERE id = $1 AND NOT ($2 = ANY(attendee_ids)) RETURNING {EVENT_COLUMNS}"
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, event_id = %event_id, "Failed to add attendee in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if let Some(row) = row {
            return Ok(JoinAttemptResult::Joined(Self::row_to_event(&row)));
        }

        // No row updated: either the event is missing or the user is
        // already in the set
        match self.find_event(event_id).await? {
            Some(_) => Ok(JoinAttemptResult::AlreadyJoined),
            None => Ok(JoinAttemptResult::EventNotFound),
        }
    }

    #[instrument(skip(self))]
    async fn try_remove_attendee(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<UnjoinAttemptResult, AppError> {
        let row = sqlx::query(&format!(
            "UPDATE events SET attendee_ids = array_remove(attendee_ids, $2) \
             WHERE id = $1 AND $2 = ANY(attendee_ids) RETURNING {EVENT_COLUMNS}"
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, event_id = %event_id, "Failed to remove attendee in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if let Some(row) = row {
            return Ok(UnjoinAttemptResult::Removed(Self::row_to_event(&row)));
        }

        match self.find_event(event_id).await? {
            Some(_) => Ok(UnjoinAttemptResult::NotJoined),
            None => Ok(UnjoinAttemptResult::EventNotFound),
        }
    }
}
