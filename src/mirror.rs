//! Local mirror of one room visit.
//!
//! [`RoomMirror`] keeps two regions apart:
//!
//! - **authoritative**: the room snapshot, vote tally and private reveal,
//!   written only by inbound server messages;
//! - **derived**: the local vote selection, written by local clicks and reset
//!   by phase transitions of the authoritative region.
//!
//! Flow is one-way. A snapshot update computes its [`PhaseTransition`] once
//! and hands it to each listener; nothing in the derived region ever feeds
//! back into the authoritative one. Applying a message never produces an
//! outbound intent.

use tracing::{debug, warn};

use crate::event::RoomEvent;
use crate::gate::{ActionGate, LocalIdentity};
use crate::protocol::{ConnectionId, Phase, Player, RoleReveal, ServerMessage};
use crate::role::PrivateRoleCache;
use crate::session::SessionStateStore;
use crate::vote::VoteSelectionTracker;

#[derive(Debug, Clone, Default)]
struct Authoritative {
    store: SessionStateStore,
    roles: PrivateRoleCache,
}

#[derive(Debug, Clone, Default)]
struct Derived {
    selection: VoteSelectionTracker,
}

/// Everything the client knows about the room it is visiting.
#[derive(Debug, Clone)]
pub struct RoomMirror {
    local: LocalIdentity,
    authoritative: Authoritative,
    derived: Derived,
}

impl RoomMirror {
    /// An empty mirror for a player joining under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            local: LocalIdentity::new(name),
            authoritative: Authoritative::default(),
            derived: Derived::default(),
        }
    }

    /// Apply one inbound message and describe what changed.
    pub fn apply(&mut self, msg: ServerMessage) -> RoomEvent {
        match msg {
            ServerMessage::Connected { id } => {
                self.set_connection_id(id.clone());
                RoomEvent::Connected { connection_id: id }
            }
            ServerMessage::State(snapshot) => {
                let transition = self.authoritative.store.apply_snapshot(snapshot);
                self.authoritative.roles.on_transition(&transition);
                self.derived.selection.on_transition(&transition);
                RoomEvent::StateUpdated { transition }
            }
            ServerMessage::Votes(tally) => {
                self.authoritative.store.apply_tally(tally);
                RoomEvent::VotesUpdated
            }
            ServerMessage::Role(reveal) => {
                self.authoritative.roles.reveal(reveal);
                RoomEvent::RoleRevealed
            }
            ServerMessage::Error { message } => {
                warn!(%message, "server reported an error");
                RoomEvent::Notice { message }
            }
        }
    }

    /// Record the identifier the transport confirmed. A reconnection
    /// replaces it, and host status follows on the next read.
    pub fn set_connection_id(&mut self, id: ConnectionId) {
        if self.local.connection_id.as_ref() != Some(&id) {
            debug!(connection_id = %id, "local connection identifier assigned");
        }
        self.local.connection_id = Some(id);
    }

    pub fn local(&self) -> &LocalIdentity {
        &self.local
    }

    pub fn store(&self) -> &SessionStateStore {
        &self.authoritative.store
    }

    /// `true` until the first snapshot arrives; render a loading state.
    pub fn is_loading(&self) -> bool {
        self.authoritative.store.is_loading()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.authoritative.store.phase()
    }

    /// Whether the local connection is the current host.
    pub fn is_host(&self) -> bool {
        self.authoritative
            .store
            .is_host(self.local.connection_id.as_ref())
    }

    /// The local player's own record in the snapshot.
    pub fn local_player(&self) -> Option<&Player> {
        let id = self.local.connection_id.as_ref()?;
        self.authoritative.store.player_by_id(id)
    }

    pub fn gate(&self) -> ActionGate<'_> {
        self.derived
            .selection
            .gate(&self.authoritative.store, &self.local)
    }

    pub fn can_cast_vote(&self, player: &Player) -> bool {
        self.gate().can_cast_vote(player)
    }

    pub fn can_start_game(&self) -> bool {
        self.gate().can_start_game()
    }

    pub fn can_open_voting(&self) -> bool {
        self.gate().can_open_voting()
    }

    pub fn can_restart_round(&self) -> bool {
        self.gate().can_restart_round()
    }

    /// Players who may currently be voted for, in display order.
    pub fn selectable_targets(&self) -> Vec<&Player> {
        let gate = self.gate();
        self.authoritative
            .store
            .players()
            .iter()
            .filter(|p| gate.can_cast_vote(p))
            .collect()
    }

    /// Try to record `target` as this round's vote.
    ///
    /// Returns `true` only if the selection was recorded, in which case the
    /// caller owes the server exactly one vote intent.
    pub fn select_vote(&mut self, target: &str) -> bool {
        self.derived
            .selection
            .select(&self.authoritative.store, &self.local, target)
    }

    pub fn selection(&self) -> Option<&str> {
        self.derived.selection.selected()
    }

    /// The latest reveal, whether or not the round has started.
    pub fn role_reveal(&self) -> Option<&RoleReveal> {
        self.authoritative.roles.current()
    }

    /// The reveal as it should be shown: hidden while loading or in the lobby.
    pub fn visible_role(&self) -> Option<&RoleReveal> {
        match self.phase() {
            Some(Phase::Playing | Phase::Voting | Phase::Ended) => self.role_reveal(),
            Some(Phase::Lobby) | None => None,
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
    use crate::protocol::{Role, RoomSnapshot, VoteTally};

    fn state(phase: Phase, host: &str, alive: &[(&str, &str, bool)]) -> ServerMessage {
        ServerMessage::State(RoomSnapshot {
            room_code: "ROOM1".into(),
            phase,
            host_id: Some(host.into()),
            players: alive
                .iter()
                .map(|(id, name, alive)| Player {
                    id: (*id).into(),
                    name: (*name).into(),
                    alive: *alive,
                    score: 0,
                })
                .collect(),
            message: None,
        })
    }

    const FOUR: &[(&str, &str, bool)] = &[
        ("a", "Ann", true),
        ("b", "Bob", true),
        ("c", "Cid", true),
        ("d", "Dee", true),
    ];

    fn connected(name: &str, id: &str) -> RoomMirror {
        let mut mirror = RoomMirror::new(name);
        mirror.apply(ServerMessage::Connected { id: id.into() });
        mirror
    }

    #[test]
    fn loading_until_first_snapshot() {
        let mut mirror = connected("Ann", "a");
        assert!(mirror.is_loading());
        assert!(!mirror.can_start_game());
        mirror.apply(state(Phase::Lobby, "a", FOUR));
        assert!(!mirror.is_loading());
        assert!(mirror.can_start_game());
    }

    #[test]
    fn host_flips_with_snapshot() {
        let mut mirror = connected("Ann", "a");
        mirror.apply(state(Phase::Lobby, "a", FOUR));
        assert!(mirror.is_host());
        mirror.apply(state(Phase::Lobby, "b", FOUR));
        assert!(!mirror.is_host());
        assert!(!mirror.can_start_game());
    }

    #[test]
    fn reconnection_recomputes_host() {
        let mut mirror = connected("Ann", "a");
        mirror.apply(state(Phase::Lobby, "a2", FOUR));
        assert!(!mirror.is_host());
        mirror.apply(ServerMessage::Connected { id: "a2".into() });
        assert!(mirror.is_host());
    }

    #[test]
    fn selection_reset_on_leaving_voting() {
        let mut mirror = connected("Ann", "a");
        mirror.apply(state(Phase::Voting, "a", FOUR));
        assert!(mirror.select_vote("Bob"));
        assert_eq!(mirror.selection(), Some("Bob"));
        assert!(mirror.selectable_targets().is_empty());

        mirror.apply(state(Phase::Voting, "a", FOUR));
        assert_eq!(mirror.selection(), Some("Bob"));

        mirror.apply(state(Phase::Ended, "a", FOUR));
        assert_eq!(mirror.selection(), None);
    }

    #[test]
    fn selectable_targets_excludes_self_and_dead() {
        let mut mirror = connected("Ann", "a");
        mirror.apply(state(
            Phase::Voting,
            "a",
            &[
                ("a", "Ann", true),
                ("b", "Bob", false),
                ("c", "Cid", true),
                ("d", "Dee", true),
            ],
        ));
        let names: Vec<&str> = mirror
            .selectable_targets()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["Cid", "Dee"]);
    }

    #[test]
    fn early_reveal_hidden_in_lobby_then_shown() {
        let mut mirror = connected("Ann", "a");
        mirror.apply(state(Phase::Lobby, "a", FOUR));
        mirror.apply(ServerMessage::Role(RoleReveal {
            role: Some(Role::Civilian),
            word: Some("Lamp".into()),
        }));
        assert!(mirror.visible_role().is_none());
        assert!(mirror.role_reveal().is_some());

        mirror.apply(state(Phase::Playing, "a", FOUR));
        assert_eq!(mirror.visible_role().unwrap().word.as_deref(), Some("Lamp"));
    }

    #[test]
    fn notice_does_not_touch_state() {
        let mut mirror = connected("Ann", "a");
        mirror.apply(state(Phase::Voting, "a", FOUR));
        mirror.apply(ServerMessage::Votes(Some(VoteTally::from([(
            "Bob".to_string(),
            1,
        )]))));
        mirror.select_vote("Bob");
        let before = mirror.clone();

        let event = mirror.apply(ServerMessage::Error {
            message: "Room is full".into(),
        });

        assert_eq!(
            event,
            RoomEvent::Notice {
                message: "Room is full".into()
            }
        );
        assert_eq!(mirror.store().snapshot(), before.store().snapshot());
        assert_eq!(mirror.store().tally(), before.store().tally());
        assert_eq!(mirror.selection(), before.selection());
        assert_eq!(mirror.role_reveal(), before.role_reveal());
    }

    #[test]
    fn local_player_found_by_connection_id() {
        let mut mirror = connected("Cid", "c");
        mirror.apply(state(Phase::Playing, "a", FOUR));
        assert_eq!(mirror.local_player().unwrap().name, "Cid");
    }
}
