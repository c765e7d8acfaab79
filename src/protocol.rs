//! Wire-compatible protocol types for the Undercover room server.
//!
//! Every frame is a JSON object of the form `{"type": "<event>", "data": ...}`.
//! Event names and field names match the server exactly (`join-room`,
//! `votedName`, `hostId`, ...), so the Rust names below are renamed where the
//! server uses kebab-case or camelCase.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ── Identifiers ─────────────────────────────────────────────────────

/// Connection identifier assigned by the server to one transport connection.
///
/// Host status is always derived by comparing this against
/// [`RoomSnapshot::host_id`]; a reconnection yields a new identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ── Enums ───────────────────────────────────────────────────────────

/// Stage of play for a room. The server alone advances it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Waiting for the host to start a round.
    Lobby,
    /// Roles are dealt and players discuss.
    Playing,
    /// Players pick someone to eliminate.
    Voting,
    /// The round is resolved and the outcome announced.
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lobby => "lobby",
            Self::Playing => "playing",
            Self::Voting => "voting",
            Self::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Secret role dealt to a player for one round.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Civilian,
    Undercover,
}

// ── Structs ─────────────────────────────────────────────────────────

/// One player inside a [`RoomSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: ConnectionId,
    pub name: String,
    pub alive: bool,
    /// Accumulated score; older servers omit it for fresh players.
    #[serde(default)]
    pub score: u32,
}

/// Full authoritative room state as last broadcast by the server.
///
/// Each `state` frame replaces the previous snapshot wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_code: String,
    pub phase: Phase,
    /// Connection identifier of the current host, if any.
    #[serde(default)]
    pub host_id: Option<ConnectionId>,
    /// Display order, not significance order.
    #[serde(default)]
    pub players: Vec<Player>,
    /// Narrative line for the current phase, e.g. an elimination announcement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Votes accumulated per player name for the current voting round.
pub type VoteTally = BTreeMap<String, u32>;

/// Private role/word pair revealed to the local player only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleReveal {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub word: Option<String>,
}

// ── Messages ────────────────────────────────────────────────────────

/// Intents sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    /// Announce room membership. Sent once per transport connection.
    #[serde(rename = "join-room")]
    JoinRoom { room: String, name: String },
    /// Cast this round's elimination vote.
    #[serde(rename = "vote")]
    Vote {
        room: String,
        #[serde(rename = "votedName")]
        voted_name: String,
    },
    /// Host: deal roles and begin a round.
    #[serde(rename = "startGame")]
    StartGame,
    /// Host: close discussion and open voting.
    #[serde(rename = "start-voting")]
    StartVoting { room: String },
    /// Host: return an ended room to the lobby.
    #[serde(rename = "play-again")]
    PlayAgain { room: String },
    /// Leave the room.
    #[serde(rename = "leaveRoom")]
    LeaveRoom,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// Transport greeting carrying this connection's identifier.
    #[serde(rename = "connected")]
    Connected { id: ConnectionId },
    /// Full room snapshot replacement.
    #[serde(rename = "state")]
    State(RoomSnapshot),
    /// Full vote tally replacement; `null` means no votes.
    #[serde(rename = "votes")]
    Votes(Option<VoteTally>),
    /// Private role reveal for the local player.
    #[serde(rename = "role")]
    Role(RoleReveal),
    /// User-facing notice from the server.
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    /// The wire event name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::State(_) => "state",
            Self::Votes(_) => "votes",
            Self::Role(_) => "role",
            Self::Error { .. } => "error",
        }
    }
}

impl ClientMessage {
    /// The wire event name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join-room",
            Self::Vote { .. } => "vote",
            Self::StartGame => "startGame",
            Self::StartVoting { .. } => "start-voting",
            Self::PlayAgain { .. } => "play-again",
            Self::LeaveRoom => "leaveRoom",
        }
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
    fn client_message_kind_matches_wire_tag() {
        let messages = [
            ClientMessage::JoinRoom {
                room: "ABCDE".into(),
                name: "Ann".into(),
            },
            ClientMessage::Vote {
                room: "ABCDE".into(),
                voted_name: "Bob".into(),
            },
            ClientMessage::StartGame,
            ClientMessage::StartVoting {
                room: "ABCDE".into(),
            },
            ClientMessage::PlayAgain {
                room: "ABCDE".into(),
            },
            ClientMessage::LeaveRoom,
        ];
        for msg in messages {
            let value = serde_json::to_value(&msg).unwrap();
            assert_eq!(value["type"], msg.kind());
        }
    }

    #[test]
    fn snapshot_missing_optional_fields_uses_defaults() {
        let json = r#"{"roomCode":"XY12Z","phase":"lobby"}"#;
        let snapshot: RoomSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.host_id, None);
        assert!(snapshot.players.is_empty());
        assert_eq!(snapshot.message, None);
    }

    #[test]
    fn player_score_defaults_to_zero() {
        let json = r#"{"id":"s1","name":"Ann","alive":true}"#;
        let player: Player = serde_json::from_str(json).unwrap();
        assert_eq!(player.score, 0);
    }

    #[test]
    fn phase_display_is_wire_name() {
        for phase in [Phase::Lobby, Phase::Playing, Phase::Voting, Phase::Ended] {
            let wire = serde_json::to_value(phase).unwrap();
            assert_eq!(wire, phase.to_string());
        }
    }

    #[test]
    fn connection_id_is_transparent() {
        let id = ConnectionId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""abc""#);
        assert_eq!(id.as_str(), "abc");
    }
}
