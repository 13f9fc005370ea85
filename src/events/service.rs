use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::EventModel,
    repository::{EventRepository, JoinAttemptResult, UnjoinAttemptResult},
    types::{EventFields, EventResponse, MembershipChange, UserRef},
};
use crate::{shared::AppError, users::UserRepository};

/// Service owning the authoritative attendee sets and their admission rules
///
/// All mutations commit against the repository before any notification is
/// constructed; broadcasting happens in the handlers, decoupled from here.
pub struct EventService {
    repository: Arc<dyn EventRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
}

impl EventService {
    pub fn new(
        repository: Arc<dyn EventRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        Self { repository, users }
    }

    fn validate_fields(fields: &EventFields) -> Result<(), AppError> {
        let mut errors = Vec::new();
        if fields.title.trim().is_empty() {
            errors.push("Title is required".to_string());
        }
        if fields.description.trim().is_empty() {
            errors.push("Description is required".to_string());
        }
        if fields.start_date >= fields.end_date {
            errors.push("Start date must be before end date".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }

    /// Resolves raw user references into display identities
    ///
    /// A dangling reference falls back to the id itself rather than failing
    /// the whole snapshot.
    async fn resolve(&self, event: EventModel) -> Result<EventResponse, AppError> {
        let creator_name = self
            .users
            .username_of(&event.creator_id)
            .await?
            .unwrap_or_else(|| event.creator_id.clone());

        let mut attendees = Vec::with_capacity(event.attendee_ids.len());
        for user_id in &event.attendee_ids {
            let username = self
                .users
                .username_of(user_id)
                .await?
                .unwrap_or_else(|| user_id.clone());
            attendees.push(UserRef {
                id: user_id.clone(),
                username,
            });
        }

        Ok(EventResponse {
            id: event.id,
            title: event.title,
            description: event.description,
            location: event.location,
            start_date: event.start_date,
            end_date: event.end_date,
            creator: UserRef {
                id: event.creator_id.clone(),
                username: creator_name,
            },
            attendees,
            created_at: event.created_at,
        })
    }

    /// Lists all events, newest first, with identities resolved
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<EventResponse>, AppError> {
        let events = self.repository.list_events().await?;
        debug!(event_count = events.len(), "Events retrieved");

        let mut responses = Vec::with_capacity(events.len());
        for event in events {
            responses.push(self.resolve(event).await?);
        }
        Ok(responses)
    }

    /// Creates a new event owned by `creator_id`
    ///
    /// Guest identities are rejected here as well as at the routing
    /// boundary, so direct callers cannot bypass the rule.
    #[instrument(skip(self, fields))]
    pub async fn create(
        &self,
        creator_id: &str,
        fields: EventFields,
    ) -> Result<EventResponse, AppError> {
        let creator = self
            .users
            .find_by_id(creator_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if creator.is_guest {
            warn!(user_id = %creator_id, "Guest attempted to create an event");
            return Err(AppError::Unauthorized(
                "Guests cannot create events".to_string(),
            ));
        }

        Self::validate_fields(&fields)?;

        let event = EventModel::new(creator_id.to_string(), fields);
        self.repository.create_event(&event).await?;

        info!(event_id = %event.id, creator_id = %creator_id, "Event created");
        self.resolve(event).await
    }

    /// Updates an event's fields; only the creator may do this, and a
    /// non-owner gets the same NotFound as a missing event
    #[instrument(skip(self, fields))]
    pub async fn update(
        &self,
        event_id: &str,
        editor_id: &str,
        fields: EventFields,
    ) -> Result<EventResponse, AppError> {
        Self::validate_fields(&fields)?;

        // Carrier for the new field values; attendee set is untouched
        let mut candidate = EventModel::new(editor_id.to_string(), fields);
        candidate.id = event_id.to_string();

        let updated = self
            .repository
            .update_owned(&candidate, editor_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        info!(event_id = %event_id, "Event updated");
        self.resolve(updated).await
    }

    /// Deletes an event; same ownership-or-not-found semantics as update
    #[instrument(skip(self))]
    pub async fn remove(&self, event_id: &str, editor_id: &str) -> Result<(), AppError> {
        let deleted = self.repository.delete_owned(event_id, editor_id).await?;
        if !deleted {
            return Err(AppError::NotFound("Event not found".to_string()));
        }

        info!(event_id = %event_id, "Event deleted");
        Ok(())
    }

    /// Joins the current user to an event, subject to the time window
    #[instrument(skip(self))]
    pub async fn join(&self, event_id: &str, user_id: &str) -> Result<MembershipChange, AppError> {
        self.join_at(event_id, user_id, Utc::now()).await
    }

    /// Join with an explicit clock, the linearization point for membership
    ///
    /// The window check reads a snapshot, but the membership mutation
    /// itself is a single conditional update in the repository.
    pub async fn join_at(
        &self,
        event_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MembershipChange, AppError> {
        let event = self
            .repository
            .find_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        // Window is inclusive at both ends
        if now < event.start_date {
            debug!(event_id = %event_id, "Join rejected: event not started");
            return Err(AppError::NotStarted);
        }
        if now > event.end_date {
            debug!(event_id = %event_id, "Join rejected: event ended");
            return Err(AppError::Ended);
        }

        let updated = match self.repository.try_add_attendee(event_id, user_id).await? {
            JoinAttemptResult::Joined(updated) => updated,
            JoinAttemptResult::AlreadyJoined => return Err(AppError::AlreadyJoined),
            JoinAttemptResult::EventNotFound => {
                return Err(AppError::NotFound("Event not found".to_string()))
            }
        };

        let username = self
            .users
            .username_of(user_id)
            .await?
            .unwrap_or_else(|| user_id.to_string());

        info!(
            event_id = %event_id,
            user_id = %user_id,
            attendee_count = updated.attendee_count(),
            "User joined event"
        );

        Ok(MembershipChange {
            event: self.resolve(updated).await?,
            username,
        })
    }

    /// Removes the current user from an event's attendee set
    ///
    /// Deliberately has no temporal restriction: a user may unjoin an
    /// event that has already ended.
    #[instrument(skip(self))]
    pub async fn unjoin(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<MembershipChange, AppError> {
        let updated = match self
            .repository
            .try_remove_attendee(event_id, user_id)
            .await?
        {
            UnjoinAttemptResult::Removed(updated) => updated,
            UnjoinAttemptResult::NotJoined => return Err(AppError::NotJoined),
            UnjoinAttemptResult::EventNotFound => {
                return Err(AppError::NotFound("Event not found".to_string()))
            }
        };

        let username = self
            .users
            .username_of(user_id)
            .await?
            .unwrap_or_else(|| user_id.to_string());

        info!(
            event_id = %event_id,
            user_id = %user_id,
            attendee_count = updated.attendee_count(),
            "User left event"
        );

        Ok(MembershipChange {
            event: self.resolve(updated).await?,
            username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::repository::InMemoryEventRepository;
    use crate::users::{InMemoryUserRepository, UserModel};
    use chrono::Duration;
    use rstest::rstest;

    struct Fixture {
        service: Arc<EventService>,
        users: Arc<InMemoryUserRepository>,
    }

    impl Fixture {
        fn new() -> Self {
            let users = Arc::new(InMemoryUserRepository::new());
            let events = Arc::new(InMemoryEventRepository::new());
            let service = Arc::new(EventService::new(events, users.clone()));
            Self { service, users }
        }

        async fn add_user(&self, username: &str) -> String {
            let user = UserModel::new(
                username.to_string(),
                format!("{}@example.com", username),
                "hash".to_string(),
            );
            self.users.create_user(&user).await.unwrap();
            user.id
        }

        async fn add_guest(&self, username: &str) -> String {
            let user = UserModel::new_guest(
                username.to_string(),
                format!("{}@guest.local", username),
                "hash".to_string(),
            );
            self.users.create_user(&user).await.unwrap();
            user.id
        }
    }

    fn active_fields() -> EventFields {
        let now = Utc::now();
        EventFields {
            title: "Rust meetup".to_string(),
            description: "Monthly meetup".to_string(),
            location: Some("Community hall".to_string()),
            start_date: now - Duration::hours(1),
            end_date: now + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn test_create_resolves_creator() {
        let fx = Fixture::new();
        let creator = fx.add_user("alice").await;

        let event = fx.service.create(&creator, active_fields()).await.unwrap();
        assert_eq!(event.creator.username, "alice");
        assert_eq!(event.attendee_count(), 0);
    }

    #[tokio::test]
    async fn test_guest_cannot_create() {
        let fx = Fixture::new();
        let guest = fx.add_guest("guest-otter").await;

        let result = fx.service.create(&guest, active_fields()).await;
        assert!(matches!(result.unwrap_err(), AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_create_validation_failures() {
        let fx = Fixture::new();
        let creator = fx.add_user("alice").await;

        let now = Utc::now();
        let fields = EventFields {
            title: "".to_string(),
            description: "".to_string(),
            location: None,
            start_date: now + Duration::hours(2),
            end_date: now, // start after end
        };

        match fx.service.create(&creator, fields).await.unwrap_err() {
            AppError::Validation(errors) => {
                assert_eq!(errors.len(), 3);
                assert!(errors.iter().any(|e| e.contains("Title")));
                assert!(errors.iter().any(|e| e.contains("before end date")));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_join_and_double_join() {
        let fx = Fixture::new();
        let creator = fx.add_user("alice").await;
        let joiner = fx.add_user("bob").await;
        let event = fx.service.create(&creator, active_fields()).await.unwrap();

        let change = fx.service.join(&event.id, &joiner).await.unwrap();
        assert_eq!(change.username, "bob");
        assert_eq!(change.event.attendee_count(), 1);
        assert_eq!(change.event.attendees[0].username, "bob");

        let second = fx.service.join(&event.id, &joiner).await;
        assert!(matches!(second.unwrap_err(), AppError::AlreadyJoined));

        // Set unchanged by the rejected join
        let listed = fx.service.list().await.unwrap();
        assert_eq!(listed[0].attendee_count(), 1);
    }

    #[tokio::test]
    async fn test_unjoin_without_join() {
        let fx = Fixture::new();
        let creator = fx.add_user("alice").await;
        let user = fx.add_user("bob").await;
        let event = fx.service.create(&creator, active_fields()).await.unwrap();

        let result = fx.service.unjoin(&event.id, &user).await;
        assert!(matches!(result.unwrap_err(), AppError::NotJoined));
    }

    #[tokio::test]
    async fn test_unjoin_after_event_ended() {
        // The asymmetry is intentional: join is window-limited, unjoin is not
        let fx = Fixture::new();
        let creator = fx.add_user("alice").await;
        let user = fx.add_user("bob").await;
        let event = fx.service.create(&creator, active_fields()).await.unwrap();
        fx.service.join(&event.id, &user).await.unwrap();

        let after_end = Utc::now() + Duration::hours(5);
        // Join would fail at this time...
        let rejoin = fx.service.join_at(&event.id, &creator, after_end).await;
        assert!(matches!(rejoin.unwrap_err(), AppError::Ended));

        // ...but unjoin still succeeds
        let change = fx.service.unjoin(&event.id, &user).await.unwrap();
        assert_eq!(change.event.attendee_count(), 0);
    }

    #[rstest]
    #[case::at_start(0, true)]
    #[case::just_before_start(-1, false)]
    #[case::at_end(7_200, true)]
    #[case::just_after_end(7_201, false)]
    #[tokio::test]
    async fn test_join_window_boundaries(#[case] offset_secs: i64, #[case] should_succeed: bool) {
        let fx = Fixture::new();
        let creator = fx.add_user("alice").await;
        let joiner = fx.add_user("bob").await;

        let start = Utc::now() + Duration::hours(24);
        let fields = EventFields {
            title: "Window test".to_string(),
            description: "Boundary semantics".to_string(),
            location: None,
            start_date: start,
            end_date: start + Duration::hours(2),
        };
        let event = fx.service.create(&creator, fields).await.unwrap();

        let now = start + Duration::seconds(offset_secs);
        let result = fx.service.join_at(&event.id, &joiner, now).await;
        assert_eq!(result.is_ok(), should_succeed);
        if !should_succeed {
            let err = result.unwrap_err();
            if offset_secs < 0 {
                assert!(matches!(err, AppError::NotStarted));
            } else {
                assert!(matches!(err, AppError::Ended));
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_joins_by_distinct_users() {
        let fx = Fixture::new();
        let creator = fx.add_user("alice").await;
        let event = fx.service.create(&creator, active_fields()).await.unwrap();

        let mut user_ids = Vec::new();
        for i in 0..5 {
            user_ids.push(fx.add_user(&format!("user-{}", i)).await);
        }

        let handles = user_ids
            .iter()
            .map(|user_id| {
                let service = Arc::clone(&fx.service);
                let event_id = event.id.clone();
                let user_id = user_id.clone();
                tokio::spawn(async move { service.join(&event_id, &user_id).await })
            })
            .collect::<Vec<_>>();

        let results = futures::future::join_all(handles).await;
        let successes = results.into_iter().filter(|r| r.as_ref().unwrap().is_ok()).count();
        assert_eq!(successes, 5);

        let listed = fx.service.list().await.unwrap();
        assert_eq!(listed[0].attendee_count(), 5, "no lost updates");
    }

    #[tokio::test]
    async fn test_concurrent_joins_by_same_user() {
        let fx = Fixture::new();
        let creator = fx.add_user("alice").await;
        let joiner = fx.add_user("bob").await;
        let event = fx.service.create(&creator, active_fields()).await.unwrap();

        let handles = (0..2)
            .map(|_| {
                let service = Arc::clone(&fx.service);
                let event_id = event.id.clone();
                let user_id = joiner.clone();
                tokio::spawn(async move { service.join(&event_id, &user_id).await })
            })
            .collect::<Vec<_>>();

        let results = futures::future::join_all(handles).await;
        let (ok, already): (Vec<_>, Vec<_>) = results
            .into_iter()
            .map(|r| r.unwrap())
            .partition(|r| r.is_ok());

        assert_eq!(ok.len(), 1, "exactly one join wins");
        assert_eq!(already.len(), 1);
        assert!(matches!(
            already.into_iter().next().unwrap().unwrap_err(),
            AppError::AlreadyJoined
        ));

        let listed = fx.service.list().await.unwrap();
        assert_eq!(listed[0].attendee_count(), 1);
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_not_found() {
        let fx = Fixture::new();
        let creator = fx.add_user("alice").await;
        let intruder = fx.add_user("mallory").await;
        let event = fx.service.create(&creator, active_fields()).await.unwrap();

        let result = fx
            .service
            .update(&event.id, &intruder, active_fields())
            .await;
        // Non-owners see the same error as a missing event
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_preserves_attendees() {
        let fx = Fixture::new();
        let creator = fx.add_user("alice").await;
        let joiner = fx.add_user("bob").await;
        let event = fx.service.create(&creator, active_fields()).await.unwrap();
        fx.service.join(&event.id, &joiner).await.unwrap();

        let mut fields = active_fields();
        fields.title = "Renamed".to_string();
        let updated = fx.service.update(&event.id, &creator, fields).await.unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.attendee_count(), 1);
        assert_eq!(updated.attendees[0].username, "bob");
    }

    #[tokio::test]
    async fn test_remove_by_non_owner_is_not_found() {
        let fx = Fixture::new();
        let creator = fx.add_user("alice").await;
        let intruder = fx.add_user("mallory").await;
        let event = fx.service.create(&creator, active_fields()).await.unwrap();

        let result = fx.service.remove(&event.id, &intruder).await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));

        // Still there for the rightful owner
        fx.service.remove(&event.id, &creator).await.unwrap();
    }

    #[tokio::test]
    async fn test_join_missing_event() {
        let fx = Fixture::new();
        let user = fx.add_user("bob").await;

        let result = fx.service.join("missing-event", &user).await;
        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }
}
