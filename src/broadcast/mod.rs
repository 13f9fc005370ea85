// Public API - what other modules can use
pub use broadcaster::EventBroadcaster;
pub use notifications::{Notification, Route};

// Internal modules
mod broadcaster;
mod notifications;
