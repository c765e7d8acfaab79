//! Transport abstraction for the Undercover room protocol.
//!
//! The [`Transport`] trait is a bidirectional text message channel between
//! the client and the session server. Every frame is one JSON message, so a
//! transport handles its own framing (WebSocket frames, a socket.io bridge,
//! an in-process channel for tests, ...).
//!
//! # Connection Setup
//!
//! Establishing the connection is not part of this trait. Build a connected
//! transport externally and hand it to
//! [`ConnectionManager::connect_with`](crate::connection::ConnectionManager::connect_with),
//! which validates the room visit before invoking your connector.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use undercover_client::error::UndercoverError;
//! use undercover_client::transport::Transport;
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn send(&mut self, message: String) -> Result<(), UndercoverError> {
//!         // Send the JSON text message over your transport
//!         unimplemented!()
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, UndercoverError>> {
//!         // Receive the next JSON text message
//!         // Return None when the connection is closed cleanly
//!         unimplemented!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), UndercoverError> {
//!         unimplemented!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::UndercoverError;

/// A bidirectional text message transport to the session server.
///
/// Each call to [`send`](Transport::send) transmits one complete JSON message
/// and each call to [`recv`](Transport::recv) returns one. Messages for a room
/// must be delivered in send order; the client neither reorders nor
/// deduplicates them.
///
/// # Cancel Safety
///
/// [`recv`](Transport::recv) **MUST** be cancel-safe because the transport
/// loop polls it inside `tokio::select!`. Channel-backed implementations are
/// naturally cancel-safe.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send a JSON text message to the server.
    ///
    /// # Errors
    ///
    /// Returns [`UndercoverError::TransportSend`] if the message could not be
    /// sent, or [`UndercoverError::TransportClosed`] after [`close`](Transport::close).
    async fn send(&mut self, message: String) -> Result<(), UndercoverError>;

    /// Receive the next JSON text message from the server.
    ///
    /// Returns:
    /// - `Some(Ok(text))`: a complete message was received
    /// - `Some(Err(e))`: the connection failed
    /// - `None`: the server closed the connection cleanly
    async fn recv(&mut self) -> Option<Result<String, UndercoverError>>;

    /// Close the transport connection gracefully.
    ///
    /// Implementations must release their resources even when the close
    /// handshake fails, and a second call must be a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the graceful shutdown handshake fails.
    async fn close(&mut self) -> Result<(), UndercoverError>;
}
