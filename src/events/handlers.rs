use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::types::{EventFields, EventResponse};
use crate::auth::AuthClaims;
use crate::broadcast::Notification;
use crate::shared::{AppError, AppState};

/// HTTP handler for listing all events
///
/// GET /api/events
/// Public; returns events newest first with identities resolved
#[instrument(name = "list_events", skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let events = state.event_service.list().await?;
    Ok(Json(events))
}

/// HTTP handler for creating an event
///
/// POST /api/events (authenticated, non-guest)
/// On success every live session receives a NEW_EVENT notification
#[instrument(name = "create_event", skip(state, claims, fields))]
pub async fn create_event(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Json(fields): Json<EventFields>,
) -> Result<(StatusCode, Json<EventResponse>), AppError> {
    info!(user_id = %claims.user_id, "Creating new event");

    let event = state.event_service.create(&claims.user_id, fields).await?;

    // Mutation is committed; delivery is best-effort from here on
    state
        .broadcaster
        .publish(Notification::NewEvent {
            event: event.clone(),
        })
        .await;

    Ok((StatusCode::CREATED, Json(event)))
}

/// HTTP handler for updating an event
///
/// PUT /api/events/:id (authenticated, creator only)
/// Room subscribers receive an EVENT_UPDATED notification
#[instrument(name = "update_event", skip(state, claims, fields))]
pub async fn update_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Extension(claims): Extension<AuthClaims>,
    Json(fields): Json<EventFields>,
) -> Result<Json<EventResponse>, AppError> {
    let event = state
        .event_service
        .update(&event_id, &claims.user_id, fields)
        .await?;

    state
        .broadcaster
        .publish(Notification::EventUpdated {
            event: event.clone(),
        })
        .await;

    Ok(Json(event))
}

/// HTTP handler for deleting an event
///
/// DELETE /api/events/:id (authenticated, creator only)
/// Every live session receives an EVENT_DELETED notification
#[instrument(name = "delete_event", skip(state, claims))]
pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<Value>, AppError> {
    state
        .event_service
        .remove(&event_id, &claims.user_id)
        .await?;

    state
        .broadcaster
        .publish(Notification::EventDeleted {
            event_id: event_id.clone(),
        })
        .await;

    Ok(Json(json!({ "message": "Event deleted" })))
}

/// HTTP handler for joining an event
///
/// POST /api/events/:id/join (authenticated; guests allowed)
/// Room subscribers receive an ATTENDEE_JOINED notification
#[instrument(name = "join_event", skip(state, claims))]
pub async fn join_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<EventResponse>, AppError> {
    let change = state
        .event_service
        .join(&event_id, &claims.user_id)
        .await?;

    state
        .broadcaster
        .publish(Notification::attendee_joined(
            change.event.clone(),
            change.username,
        ))
        .await;

    Ok(Json(change.event))
}

/// HTTP handler for leaving an event
///
/// POST /api/events/:id/unjoin (authenticated; no time restriction)
/// Room subscribers receive an ATTENDEE_LEFT notification
#[instrument(name = "unjoin_event", skip(state, claims))]
pub async fn unjoin_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<EventResponse>, AppError> {
    let change = state
        .event_service
        .unjoin(&event_id, &claims.user_id)
        .await?;

    state
        .broadcaster
        .publish(Notification::attendee_left(
            change.event.clone(),
            change.username,
        ))
        .await;

    Ok(Json(change.event))
}
