//! # Undercover Client
//!
//! Client-side session synchronizer for the Undercover social-deduction party
//! game.
//!
//! The session server is the only authority: it deals roles and words,
//! tallies votes and advances the room through `lobby → playing → voting →
//! ended`. This crate mirrors its broadcasts locally and decides which
//! actions the local player may take, so a UI never offers an intent the
//! server would reject.
//!
//! ## Layers
//!
//! - **State core** (no runtime needed): [`protocol`] wire types,
//!   [`session::SessionStateStore`], [`role::PrivateRoleCache`],
//!   [`gate::ActionGate`], [`vote::VoteSelectionTracker`], combined in
//!   [`mirror::RoomMirror`].
//! - **Connection** (`tokio-runtime` feature): [`client::RoomSession`] drives
//!   a [`Transport`] on a background task; [`connection::ConnectionManager`]
//!   keeps at most one visit alive.
//! - **Transports** (`transport-websocket` feature, default):
//!   [`WebSocketTransport`](transports::WebSocketTransport).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "transport-websocket")]
//! # async fn example() -> Result<(), undercover_client::UndercoverError> {
//! use undercover_client::{ClientConfig, ConnectionManager, RoomEvent};
//!
//! let mut manager = ConnectionManager::new(ClientConfig::new());
//! let session = manager
//!     .connect_websocket("ws://localhost:3000/ws", "ab12c", "Ann")
//!     .await?;
//!
//! while let Some(event) = session.next_event().await {
//!     if let RoomEvent::StateUpdated { .. } = event {
//!         if session.mirror().can_start_game() {
//!             session.start_game()?;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod error;
pub mod event;
pub mod gate;
pub mod mirror;
pub mod protocol;
pub mod role;
pub mod session;
pub mod transport;
pub mod vote;

#[cfg(feature = "tokio-runtime")]
pub mod client;
#[cfg(feature = "tokio-runtime")]
pub mod connection;

pub mod transports;

// Re-export primary types for ergonomic imports.
pub use error::UndercoverError;
pub use event::RoomEvent;
pub use gate::{ActionGate, LocalIdentity, MIN_ALIVE_FOR_VOTE};
pub use mirror::RoomMirror;
pub use protocol::{
    ClientMessage, ConnectionId, Phase, Player, Role, RoleReveal, RoomSnapshot, ServerMessage,
    VoteTally,
};
pub use session::{PhaseTransition, SessionStateStore};
pub use transport::Transport;

#[cfg(feature = "tokio-runtime")]
pub use client::{ClientConfig, RoomSession};
#[cfg(feature = "tokio-runtime")]
pub use connection::{ConnectionManager, RoomVisit};

#[cfg(feature = "transport-websocket")]
pub use transports::WebSocketTransport;
