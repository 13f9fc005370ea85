// Library crate for the GatherHub event server
// This file exposes the public API for integration tests

pub mod auth;
pub mod broadcast;
pub mod events;
pub mod registry;
pub mod shared;
pub mod users;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use broadcast::{EventBroadcaster, Notification};
pub use events::{EventFields, EventModel, EventResponse};
pub use registry::RoomRegistry;
pub use shared::AppError;
pub use websockets::{ClientMessage, Connection, MessageHandler, RoomMessageHandler};
