//! Error types for the Undercover client.
//!
//! Only connection-level failures and local misuse surface here. An intent
//! that the action gate declines is not an error (the intent methods return
//! `Ok(false)`), and a server-reported problem arrives as a
//! [`RoomEvent::Notice`](crate::event::RoomEvent::Notice).

use thiserror::Error;

/// Errors that can occur when using the Undercover client.
#[derive(Debug, Error)]
pub enum UndercoverError {
    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed unexpectedly.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Attempted to send an intent after the room visit ended.
    #[error("not connected to server")]
    NotConnected,

    /// A room visit was requested without a room code or display name.
    #[error("invalid room visit: {reason}")]
    InvalidVisit {
        /// Which part of the visit was missing.
        reason: String,
    },

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for Undercover client operations.
pub type Result<T> = std::result::Result<T, UndercoverError>;
