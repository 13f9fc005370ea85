// Public API - what other modules can use
pub use handlers::{create_event, delete_event, join_event, list_events, unjoin_event, update_event};
pub use models::EventModel;
pub use types::{EventFields, EventResponse, MembershipChange, UserRef};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
