use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, instrument};

use super::types::{AuthResponse, LoginRequest, RegisterRequest};
use crate::shared::{AppError, AppState};

/// HTTP handler for user registration
///
/// POST /api/auth/register
/// Returns 201 with a JWT token and the public user view
#[instrument(name = "register", skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    info!(username = %request.username, "Registration requested");

    let response = state.auth_service.register(request).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// HTTP handler for login
///
/// POST /api/auth/login
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = state.auth_service.login(request).await?;
    Ok(Json(response))
}

/// HTTP handler for guest login
///
/// POST /api/auth/guest
/// Mints a throwaway guest identity; guests may join events but not create them
#[instrument(name = "guest_login", skip(state))]
pub async fn guest_login(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let response = state.auth_service.guest_login().await?;
    Ok(Json(response))
}
