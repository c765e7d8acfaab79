//! Events yielded by [`RoomSession::next_event`](crate::client::RoomSession::next_event).
//!
//! Each event is produced after the corresponding inbound message has been
//! applied to the [`RoomMirror`](crate::mirror::RoomMirror), so a consumer
//! reading the mirror in response always sees the updated state.

use crate::protocol::ConnectionId;
use crate::session::PhaseTransition;

/// Something changed in the room visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// The transport confirmed and assigned this connection identifier. A
    /// join-room intent has been sent for the visit.
    Connected { connection_id: ConnectionId },
    /// A new room snapshot replaced the previous one.
    StateUpdated { transition: PhaseTransition },
    /// A new vote tally replaced the previous one.
    VotesUpdated,
    /// The private role/word reveal arrived.
    RoleRevealed,
    /// The server reported a problem to show the user. No state changed.
    Notice { message: String },
    /// The connection ended. No further events follow.
    Disconnected {
        /// Why, when known. `None` means the server closed cleanly.
        reason: Option<String>,
    },
}
