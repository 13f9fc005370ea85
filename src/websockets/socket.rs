use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Simple WebSocket abstraction - all we care about is send/receive
#[async_trait]
pub trait SocketWrapper: Send {
    /// Send a text message to the client
    async fn send_message(&mut self, message: String) -> Result<(), SocketError>;

    /// Receive the next message from the client (None if connection closed)
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), SocketError>;
}

/// Handler for incoming WebSocket messages
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle an incoming message from the client
    async fn handle_message(&self, session_id: &str, message: String);
}

#[derive(Debug)]
pub enum SocketError {
    ConnectionClosed,
    SendFailed(String),
    ReceiveFailed(String),
}

/// Direct implementation on axum's WebSocket
#[async_trait]
impl SocketWrapper for WebSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.send(Message::Text(message))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        match self.next().await {
            Some(Ok(Message::Text(text))) => Ok(Some(text)),
            Some(Ok(Message::Close(_))) => Ok(None),
            Some(Ok(_)) => Ok(None), // Ignore binary/ping/pong
            Some(Err(e)) => Err(SocketError::ReceiveFailed(e.to_string())),
            None => Ok(None), // Connection closed
        }
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// Connection represents one live session's transport loop
///
/// It pumps outbound notifications (queued by the registry) to the client
/// and feeds inbound room requests to the message handler, until either
/// side disconnects.
pub struct Connection {
    pub session_id: String,
    socket: Box<dyn SocketWrapper>,
    outbound_receiver: mpsc::UnboundedReceiver<String>,
    message_handler: Arc<dyn MessageHandler>,
}

impl Connection {
    pub fn new(
        session_id: String,
        socket: Box<dyn SocketWrapper>,
        outbound_receiver: mpsc::UnboundedReceiver<String>,
        message_handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            session_id,
            socket,
            outbound_receiver,
            message_handler,
        }
    }

    /// Run the connection - handles both sending and receiving until disconnect
    pub async fn run(mut self) -> Result<(), SocketError> {
        loop {
            tokio::select! {
                // Handle outbound messages (from our app to client)
                msg = self.outbound_receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.socket.send_message(message).await?
                        }
                        None => break, // Channel closed, disconnect
                    }
                }

                // Handle inbound messages (from client to our app)
                msg = self.socket.receive_message() => {
                    match msg {
                        Ok(Some(message)) => {
                            self.message_handler
                                .handle_message(&self.session_id, message)
                                .await;
                        }
                        Ok(None) => break, // Client disconnected
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        // Clean disconnect
        let _ = self.socket.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scripted socket: yields queued inbound messages then reports closure
    struct ScriptedSocket {
        inbound: Mutex<Vec<String>>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedSocket {
        fn new(inbound: Vec<String>) -> (Self, Arc<Mutex<Vec<String>>>) {
            let sent = Arc::new(Mutex::new(Vec::new()));
            let mut inbound = inbound;
            inbound.reverse(); // pop() yields in original order
            (
                Self {
                    inbound: Mutex::new(inbound),
                    sent: sent.clone(),
                },
                sent,
            )
        }
    }

    #[async_trait]
    impl SocketWrapper for ScriptedSocket {
        async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
            Ok(self.inbound.lock().unwrap().pop())
        }

        async fn close(&mut self) -> Result<(), SocketError> {
            Ok(())
        }
    }

    struct RecordingHandler {
        seen: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl MessageHandler for RecordingHandler {
        async fn handle_message(&self, session_id: &str, message: String) {
            self.seen
                .lock()
                .unwrap()
                .push((session_id.to_string(), message));
        }
    }

    #[tokio::test]
    async fn test_inbound_messages_reach_handler_until_disconnect() {
        let (socket, _sent) = ScriptedSocket::new(vec![
            "first".to_string(),
            "second".to_string(),
        ]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(RecordingHandler { seen: seen.clone() });

        let (_tx, rx) = mpsc::unbounded_channel();
        let connection = Connection::new("s1".to_string(), Box::new(socket), rx, handler);

        connection.run().await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ("s1".to_string(), "first".to_string()));
        assert_eq!(seen[1], ("s1".to_string(), "second".to_string()));
    }

    #[tokio::test]
    async fn test_outbound_channel_close_ends_connection() {
        let (socket, _sent) = ScriptedSocket::new(vec![]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(RecordingHandler { seen });

        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(tx); // registry side goes away immediately

        let connection = Connection::new("s1".to_string(), Box::new(socket), rx, handler);
        connection.run().await.unwrap();
    }
}
