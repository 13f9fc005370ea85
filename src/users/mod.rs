// Public API - what other modules can use
pub use models::UserModel;
pub use repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository};

// Internal modules
pub mod models;
pub mod repository;
