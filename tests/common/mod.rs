#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for Undercover client integration tests.
//!
//! Provides a channel-driven [`ScriptedTransport`] that lets a test
//! push server frames at chosen moments, plus builders for the server's JSON
//! frames.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use undercover_client::protocol::{
    ClientMessage, ConnectionId, Phase, Player, Role, RoleReveal, RoomSnapshot, ServerMessage,
    VoteTally,
};
use undercover_client::{ClientConfig, RoomSession, RoomVisit, Transport, UndercoverError};

// ── Transport ───────────────────────────────────────────────────────

/// Transport whose inbound side is fed by the test through [`ServerHandle`].
pub struct ScriptedTransport {
    inbound: mpsc::UnboundedReceiver<Option<Result<String, UndercoverError>>>,
    sent: Arc<StdMutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

/// The test's side of a [`ScriptedTransport`].
#[derive(Clone)]
pub struct ServerHandle {
    inbound: mpsc::UnboundedSender<Option<Result<String, UndercoverError>>>,
    pub sent: Arc<StdMutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
}

pub fn scripted() -> (ScriptedTransport, ServerHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sent = Arc::new(StdMutex::new(Vec::new()));
    let closed = Arc::new(AtomicBool::new(false));
    (
        ScriptedTransport {
            inbound: rx,
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        },
        ServerHandle {
            inbound: tx,
            sent,
            closed,
        },
    )
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, message: String) -> Result<(), UndercoverError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, UndercoverError>> {
        match self.inbound.recv().await {
            Some(item) => item,
            // Test dropped its handle: behave like an idle connection.
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), UndercoverError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

impl ServerHandle {
    /// Push one server frame.
    pub fn push(&self, msg: &ServerMessage) {
        self.push_raw(serde_json::to_string(msg).expect("serialize server frame"));
    }

    pub fn push_raw(&self, text: String) {
        self.inbound.send(Some(Ok(text))).expect("transport alive");
    }

    /// Close the connection from the server side.
    pub fn hang_up(&self) {
        self.inbound.send(None).expect("transport alive");
    }

    /// Every frame the client has sent so far, decoded.
    pub fn sent_messages(&self) -> Vec<ClientMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|s| serde_json::from_str(s).expect("client frame"))
            .collect()
    }

    pub fn votes_sent(&self) -> usize {
        self.sent_messages()
            .iter()
            .filter(|m| matches!(m, ClientMessage::Vote { .. }))
            .count()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

// ── Session helpers ─────────────────────────────────────────────────

/// Start a session for `name` in room `ROOM1` and complete the greeting
/// with connection id `id`.
pub async fn joined_session(name: &str, id: &str) -> (RoomSession, ServerHandle) {
    let (transport, server) = scripted();
    let visit = RoomVisit::new("room1", name).expect("valid visit");
    let mut session = RoomSession::start(transport, visit, ClientConfig::new());
    server.push(&connected(id));
    let event = session.next_event().await.expect("Connected event");
    assert!(
        matches!(event, undercover_client::RoomEvent::Connected { .. }),
        "first event should be Connected, got {event:?}"
    );
    (session, server)
}

/// Push `msg` and apply it to the session, returning the resulting event.
pub async fn deliver(
    session: &mut RoomSession,
    server: &ServerHandle,
    msg: ServerMessage,
) -> undercover_client::RoomEvent {
    server.push(&msg);
    session.next_event().await.expect("event after delivery")
}

// ── Frame builders ──────────────────────────────────────────────────

pub fn connected(id: &str) -> ServerMessage {
    ServerMessage::Connected {
        id: ConnectionId::new(id),
    }
}

pub fn player(id: &str, name: &str, alive: bool, score: u32) -> Player {
    Player {
        id: id.into(),
        name: name.into(),
        alive,
        score,
    }
}

/// Four living players: Ann (a), Bob (b), Cid (c), Dee (d).
pub fn four_players() -> Vec<Player> {
    vec![
        player("a", "Ann", true, 0),
        player("b", "Bob", true, 0),
        player("c", "Cid", true, 0),
        player("d", "Dee", true, 0),
    ]
}

pub fn state(phase: Phase, host: &str, players: Vec<Player>) -> ServerMessage {
    state_with_message(phase, host, players, None)
}

pub fn state_with_message(
    phase: Phase,
    host: &str,
    players: Vec<Player>,
    message: Option<&str>,
) -> ServerMessage {
    ServerMessage::State(RoomSnapshot {
        room_code: "ROOM1".into(),
        phase,
        host_id: Some(host.into()),
        players,
        message: message.map(Into::into),
    })
}

pub fn votes(entries: &[(&str, u32)]) -> ServerMessage {
    ServerMessage::Votes(Some(
        entries
            .iter()
            .map(|(name, n)| ((*name).to_string(), *n))
            .collect::<VoteTally>(),
    ))
}

pub fn role(role: Role, word: &str) -> ServerMessage {
    ServerMessage::Role(RoleReveal {
        role: Some(role),
        word: Some(word.into()),
    })
}

pub fn error(message: &str) -> ServerMessage {
    ServerMessage::Error {
        message: message.into(),
    }
}

/// Let the transport loop drain queued intents.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}
