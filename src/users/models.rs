use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for users table
///
/// Users are created at registration or guest login and never deleted.
/// The password field always holds a bcrypt hash, never plaintext.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserModel {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_guest: bool,
    pub created_at: DateTime<Utc>,
}

impl UserModel {
    /// Creates a new registered (non-guest) user model
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            is_guest: false,
            created_at: Utc::now(),
        }
    }

    /// Creates a guest user with a generated throwaway identity
    pub fn new_guest(username: String, email: String, password_hash: String) -> Self {
        Self {
            is_guest: true,
            ..Self::new(username, email, password_hash)
        }
    }
}
