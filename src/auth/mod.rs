// Public API - what other modules can use
pub use handlers::{guest_login, login, register};
pub use middleware::jwt_auth;
pub use service::AuthService;
pub use types::AuthClaims;

// Internal modules
mod handlers;
mod middleware;
pub mod service;
mod token;
pub mod types;
