//! Concrete [`Transport`](crate::Transport) implementations, behind features.
//!
//! | Feature               | Transport              |
//! |-----------------------|------------------------|
//! | `transport-websocket` | [`WebSocketTransport`] |

#[cfg(feature = "transport-websocket")]
pub mod websocket;

#[cfg(feature = "transport-websocket")]
pub use websocket::{websocket_url, WebSocketTransport};
