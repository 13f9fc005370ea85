use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::AuthService;
use crate::broadcast::EventBroadcaster;
use crate::events::service::EventService;
use crate::registry::RoomRegistry;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub event_service: Arc<EventService>,
    pub registry: Arc<RoomRegistry>,
    pub broadcaster: Arc<EventBroadcaster>,
}

impl AppState {
    pub fn new(
        auth_service: Arc<AuthService>,
        event_service: Arc<EventService>,
        registry: Arc<RoomRegistry>,
        broadcaster: Arc<EventBroadcaster>,
    ) -> Self {
        Self {
            auth_service,
            event_service,
            registry,
            broadcaster,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error")]
    Validation(Vec<String>),

    #[error("Event has not started yet")]
    NotStarted,

    #[error("Event has already ended")]
    Ended,

    #[error("Already joined")]
    AlreadyJoined,

    #[error("Not joined yet")]
    NotJoined,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Validation errors carry per-field messages alongside the summary
        if let AppError::Validation(errors) = self {
            let body = Json(json!({
                "message": "Validation error",
                "errors": errors,
            }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        let (status, error_message) = match self {
            AppError::JwtError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::NotStarted => (
                StatusCode::BAD_REQUEST,
                "Event has not started yet".to_string(),
            ),
            AppError::Ended => (
                StatusCode::BAD_REQUEST,
                "Event has already ended".to_string(),
            ),
            AppError::AlreadyJoined => (StatusCode::BAD_REQUEST, "Already joined".to_string()),
            AppError::NotJoined => (StatusCode::BAD_REQUEST, "Not joined yet".to_string()),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
            // Persistent-store failures surface as a generic server error
            AppError::DatabaseError(_) | AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server error".to_string(),
            ),
            AppError::Validation(_) => unreachable!("handled above"),
        };

        let body = Json(json!({
            "message": error_message
        }));

        (status, body).into_response()
    }
}
