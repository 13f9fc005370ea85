// Public API - what other modules can use
pub use handler::{websocket_handler, RoomMessageHandler};
pub use messages::{ClientMessage, ClientMessageType};
pub use socket::{Connection, MessageHandler, SocketWrapper};

// Internal modules
mod handler;
mod messages;
mod socket;
