use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    token::TokenConfig,
    types::{AuthClaims, AuthResponse, LoginRequest, RegisterRequest, UserSummary},
};
use crate::{
    shared::AppError,
    users::{UserModel, UserRepository},
};

/// Service for registration, login and guest identities
pub struct AuthService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    token_config: TokenConfig,
}

impl AuthService {
    pub fn new(repository: Arc<dyn UserRepository + Send + Sync>) -> Self {
        Self {
            repository,
            token_config: TokenConfig::new(),
        }
    }

    /// Registers a new user and returns a token plus the public user view
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        info!(username = %request.username, "Registering new user");

        let mut errors = Vec::new();
        if request.username.trim().is_empty() {
            errors.push("Username is required".to_string());
        }
        if request.email.trim().is_empty() {
            errors.push("Email is required".to_string());
        }
        if request.password.is_empty() {
            errors.push("Password is required".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
            .map_err(|_| AppError::Internal)?;

        let user = UserModel::new(request.username, request.email, password_hash);
        // Repository enforces username/email uniqueness
        self.repository.create_user(&user).await?;

        let token = self.token_config.create_token(user.id.clone())?;

        info!(user_id = %user.id, username = %user.username, "User registered successfully");
        Ok(AuthResponse {
            token,
            user: UserSummary::from(&user),
        })
    }

    /// Authenticates by email and password
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let user = self
            .repository
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| {
                warn!("Login attempt with unknown email");
                AppError::Unauthorized("Invalid credentials".to_string())
            })?;

        let matches = bcrypt::verify(&request.password, &user.password_hash)
            .map_err(|_| AppError::Internal)?;
        if !matches {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        let token = self.token_config.create_token(user.id.clone())?;

        info!(user_id = %user.id, username = %user.username, "User logged in");
        Ok(AuthResponse {
            token,
            user: UserSummary::from(&user),
        })
    }

    /// Creates a throwaway guest identity and returns a token for it
    ///
    /// Guests can join and unjoin events but are rejected when creating them.
    #[instrument(skip(self))]
    pub async fn guest_login(&self) -> Result<AuthResponse, AppError> {
        let name = petname::Petnames::default().generate_one(2, "-");
        let username = format!("guest-{}", name);
        let email = format!("{}@guest.local", username);

        // Guests never log in with a password; hash a random one anyway so
        // the credential column is uniform
        let password_hash = bcrypt::hash(Uuid::new_v4().to_string(), bcrypt::DEFAULT_COST)
            .map_err(|_| AppError::Internal)?;

        let user = UserModel::new_guest(username, email, password_hash);
        self.repository.create_user(&user).await?;

        let token = self.token_config.create_token(user.id.clone())?;

        info!(user_id = %user.id, username = %user.username, "Guest user created");
        Ok(AuthResponse {
            token,
            user: UserSummary::from(&user),
        })
    }

    /// Validates a bearer token and returns its claims
    pub fn validate_token(&self, token: &str) -> Result<AuthClaims, AppError> {
        self.token_config.validate_token(token)
    }

    /// Looks up the user behind a set of validated claims
    pub async fn find_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        self.repository.find_by_id(user_id).await
    }
}
