//! Room visits and the one-connection-per-visit rule.
//!
//! A [`RoomVisit`] can only be built from a non-empty room code and display
//! name, so a visit that lacks either never reaches the transport layer; the
//! caller gets [`UndercoverError::InvalidVisit`] and should send the user
//! back to the pre-join screen.
//!
//! [`ConnectionManager`] holds at most one live [`RoomSession`]. Starting a
//! new visit (re-entry, or a different room or name) shuts the previous
//! session down first.

use std::future::Future;

use tracing::{debug, info};

use crate::client::{ClientConfig, RoomSession};
use crate::error::{Result, UndercoverError};
use crate::transport::Transport;

/// Where and as whom the local player is joining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomVisit {
    room: String,
    name: String,
}

impl RoomVisit {
    /// Validate and normalize a visit.
    ///
    /// The room code is trimmed and upper-cased; the name is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`UndercoverError::InvalidVisit`] if either value is empty or
    /// whitespace only.
    pub fn new(room: &str, name: &str) -> Result<Self> {
        let room = room.trim();
        let name = name.trim();
        if room.is_empty() {
            return Err(UndercoverError::InvalidVisit {
                reason: "room code is missing".into(),
            });
        }
        if name.is_empty() {
            return Err(UndercoverError::InvalidVisit {
                reason: "display name is missing".into(),
            });
        }
        Ok(Self {
            room: room.to_uppercase(),
            name: name.to_owned(),
        })
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Owner of the single live room connection.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    config: ClientConfig,
    session: Option<RoomSession>,
}

impl ConnectionManager {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Start a visit over a transport produced by `connector`.
    ///
    /// The visit is validated before `connector` runs, and any previous
    /// session is shut down before the new transport is established.
    ///
    /// # Errors
    ///
    /// Returns [`UndercoverError::InvalidVisit`] without calling `connector`
    /// when `room` or `name` is missing, or whatever error `connector`
    /// returns when the transport cannot be established.
    pub async fn connect_with<T, F, Fut>(
        &mut self,
        room: &str,
        name: &str,
        connector: F,
    ) -> Result<&mut RoomSession>
    where
        T: Transport,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let visit = RoomVisit::new(room, name)?;
        self.disconnect().await;

        let transport = connector().await?;
        info!(room = visit.room(), "transport established");
        let session = RoomSession::start(transport, visit, self.config.clone());
        Ok(self.session.insert(session))
    }

    /// Start a visit over a WebSocket connection to `url`, honoring
    /// [`ClientConfig::connect_timeout`].
    ///
    /// # Errors
    ///
    /// Returns [`UndercoverError::InvalidVisit`] for a missing room or name,
    /// [`UndercoverError::Timeout`] if the connect deadline passes, or the
    /// connect error from [`WebSocketTransport`](crate::transports::WebSocketTransport).
    #[cfg(feature = "transport-websocket")]
    pub async fn connect_websocket(
        &mut self,
        url: &str,
        room: &str,
        name: &str,
    ) -> Result<&mut RoomSession> {
        use crate::transports::WebSocketTransport;

        let timeout = self.config.connect_timeout;
        self.connect_with(room, name, || async move {
            match timeout {
                Some(timeout) => WebSocketTransport::connect_with_timeout(url, timeout).await,
                None => WebSocketTransport::connect(url).await,
            }
        })
        .await
    }

    /// Tear down the current visit, if any.
    pub async fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            debug!(room = session.visit().room(), "tearing down previous visit");
            session.shutdown().await;
        }
    }

    /// Leave the current room: send `leaveRoom`, then tear down.
    pub async fn leave(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.leave().await;
        }
    }

    pub fn session(&self) -> Option<&RoomSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut RoomSession> {
        self.session.as_mut()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn visit_normalizes_room_and_name() {
        let visit = RoomVisit::new("  ab12c ", " Ann ").unwrap();
        assert_eq!(visit.room(), "AB12C");
        assert_eq!(visit.name(), "Ann");
    }

    #[test]
    fn visit_rejects_missing_parts() {
        assert!(matches!(
            RoomVisit::new("", "Ann"),
            Err(UndercoverError::InvalidVisit { .. })
        ));
        assert!(matches!(
            RoomVisit::new("AB12C", "   "),
            Err(UndercoverError::InvalidVisit { .. })
        ));
    }
}
