//! Outbound intent boundary.
//!
//! [`IntentDispatcher`] turns already-validated local actions into
//! [`ClientMessage`]s and queues them for the transport loop. It does no
//! legality checks of its own: callers consult the action gate first, and
//! nothing in the inbound path ever calls into the dispatcher.

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, UndercoverError};
use crate::protocol::ClientMessage;

/// Queues intents for one room visit.
#[derive(Debug, Clone)]
pub struct IntentDispatcher {
    room: String,
    cmd_tx: mpsc::UnboundedSender<ClientMessage>,
}

impl IntentDispatcher {
    pub fn new(room: impl Into<String>, cmd_tx: mpsc::UnboundedSender<ClientMessage>) -> Self {
        Self {
            room: room.into(),
            cmd_tx,
        }
    }

    /// The room code every intent is addressed to.
    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn vote(&self, voted_name: impl Into<String>) -> Result<()> {
        self.send(ClientMessage::Vote {
            room: self.room.clone(),
            voted_name: voted_name.into(),
        })
    }

    pub fn start_game(&self) -> Result<()> {
        self.send(ClientMessage::StartGame)
    }

    pub fn start_voting(&self) -> Result<()> {
        self.send(ClientMessage::StartVoting {
            room: self.room.clone(),
        })
    }

    pub fn play_again(&self) -> Result<()> {
        self.send(ClientMessage::PlayAgain {
            room: self.room.clone(),
        })
    }

    pub fn leave_room(&self) -> Result<()> {
        self.send(ClientMessage::LeaveRoom)
    }

    /// Queue `msg` for the transport loop.
    ///
    /// # Errors
    ///
    /// Returns [`UndercoverError::NotConnected`] once the loop has exited.
    fn send(&self, msg: ClientMessage) -> Result<()> {
        debug!(kind = msg.kind(), room = %self.room, "queueing intent");
        self.cmd_tx
            .send(msg)
            .map_err(|_| UndercoverError::NotConnected)
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
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn intents_carry_room_code() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = IntentDispatcher::new("KJH7Q", tx);

        assert_ok!(dispatcher.vote("Bob"));
        assert_ok!(dispatcher.start_voting());
        assert_ok!(dispatcher.play_again());

        assert_eq!(
            rx.try_recv().unwrap(),
            ClientMessage::Vote {
                room: "KJH7Q".into(),
                voted_name: "Bob".into()
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ClientMessage::StartVoting {
                room: "KJH7Q".into()
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ClientMessage::PlayAgain {
                room: "KJH7Q".into()
            }
        );
    }

    #[test]
    fn send_after_loop_exit_is_not_connected() {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = IntentDispatcher::new("KJH7Q", tx);
        drop(rx);
        let err = assert_err!(dispatcher.start_game());
        assert!(matches!(err, UndercoverError::NotConnected));
    }
}
