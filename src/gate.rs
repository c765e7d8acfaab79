//! Legality checks for outbound intents.
//!
//! Each check mirrors the rule the server applies when it receives the
//! intent, so the client never offers an action the server would reject.
//! Checks read the current snapshot on every call; nothing is cached, so a
//! host change or phase change is reflected by the next snapshot update.

use crate::protocol::{ConnectionId, Phase, Player};
use crate::session::SessionStateStore;

/// Fewest living players for which an elimination vote can resolve.
///
/// Matches the server's resolution rule: with two or fewer alive it skips
/// elimination, so votes are not offered.
pub const MIN_ALIVE_FOR_VOTE: usize = 3;

/// Who the local player is, as far as the gate is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    /// Assigned when the transport confirms; replaced on reconnection.
    pub connection_id: Option<ConnectionId>,
    pub name: String,
}

impl LocalIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            connection_id: None,
            name: name.into(),
        }
    }
}

/// A read-only view evaluating intent legality against current state.
#[derive(Debug, Clone, Copy)]
pub struct ActionGate<'a> {
    store: &'a SessionStateStore,
    local: &'a LocalIdentity,
    selection: Option<&'a str>,
}

impl<'a> ActionGate<'a> {
    pub fn new(
        store: &'a SessionStateStore,
        local: &'a LocalIdentity,
        selection: Option<&'a str>,
    ) -> Self {
        Self {
            store,
            local,
            selection,
        }
    }

    fn in_phase(&self, phase: Phase) -> bool {
        self.store.phase() == Some(phase)
    }

    fn is_host(&self) -> bool {
        self.store.is_host(self.local.connection_id.as_ref())
    }

    /// Whether `player` may be picked as this round's vote target.
    pub fn can_cast_vote(&self, player: &Player) -> bool {
        self.in_phase(Phase::Voting)
            && self.store.alive_count() >= MIN_ALIVE_FOR_VOTE
            && player.alive
            && player.name != self.local.name
            && self.selection.is_none()
    }

    /// Whether any player named `name` may be picked.
    pub fn can_vote_for(&self, name: &str) -> bool {
        self.store
            .players()
            .iter()
            .any(|p| p.name == name && self.can_cast_vote(p))
    }

    pub fn can_start_game(&self) -> bool {
        self.is_host() && self.in_phase(Phase::Lobby)
    }

    pub fn can_open_voting(&self) -> bool {
        self.is_host() && self.in_phase(Phase::Playing)
    }

    pub fn can_restart_round(&self) -> bool {
        self.is_host() && self.in_phase(Phase::Ended)
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
    use crate::protocol::RoomSnapshot;

    fn player(id: &str, name: &str, alive: bool) -> Player {
        Player {
            id: id.into(),
            name: name.into(),
            alive,
            score: 0,
        }
    }

    fn store_with(phase: Phase, host: &str, players: Vec<Player>) -> SessionStateStore {
        let mut store = SessionStateStore::new();
        store.apply_snapshot(RoomSnapshot {
            room_code: "ROOM1".into(),
            phase,
            host_id: Some(host.into()),
            players,
            message: None,
        });
        store
    }

    fn local(id: &str, name: &str) -> LocalIdentity {
        LocalIdentity {
            connection_id: Some(id.into()),
            name: name.into(),
        }
    }

    fn four_alive() -> Vec<Player> {
        vec![
            player("a", "Ann", true),
            player("b", "Bob", true),
            player("c", "Cid", true),
            player("d", "Dee", true),
        ]
    }

    #[test]
    fn nothing_is_allowed_while_loading() {
        let store = SessionStateStore::new();
        let me = local("a", "Ann");
        let gate = ActionGate::new(&store, &me, None);
        assert!(!gate.can_start_game());
        assert!(!gate.can_open_voting());
        assert!(!gate.can_restart_round());
        assert!(!gate.can_vote_for("Bob"));
    }

    #[test]
    fn voting_allowed_for_other_living_players() {
        let store = store_with(Phase::Voting, "a", four_alive());
        let me = local("b", "Bob");
        let gate = ActionGate::new(&store, &me, None);
        assert!(gate.can_vote_for("Ann"));
        assert!(gate.can_vote_for("Cid"));
        assert!(!gate.can_vote_for("Bob"));
        assert!(!gate.can_vote_for("Nobody"));
    }

    #[test]
    fn self_vote_never_allowed() {
        for phase in [Phase::Lobby, Phase::Playing, Phase::Voting, Phase::Ended] {
            let store = store_with(phase, "a", four_alive());
            let me = local("c", "Cid");
            let gate = ActionGate::new(&store, &me, None);
            for p in store.players().iter().filter(|p| p.name == "Cid") {
                assert!(!gate.can_cast_vote(p));
            }
        }
    }

    #[test]
    fn eliminated_players_are_not_targets() {
        let mut players = four_alive();
        players[3].alive = false;
        let store = store_with(Phase::Voting, "a", players);
        let me = local("a", "Ann");
        let gate = ActionGate::new(&store, &me, None);
        assert!(!gate.can_vote_for("Dee"));
        assert!(gate.can_vote_for("Bob"));
    }

    #[test]
    fn two_alive_disables_every_target() {
        let store = store_with(
            Phase::Voting,
            "a",
            vec![
                player("a", "Ann", true),
                player("b", "Bob", true),
                player("c", "Cid", false),
            ],
        );
        let me = local("a", "Ann");
        let gate = ActionGate::new(&store, &me, None);
        assert!(store.players().iter().all(|p| !gate.can_cast_vote(p)));
    }

    #[test]
    fn existing_selection_blocks_further_votes() {
        let store = store_with(Phase::Voting, "a", four_alive());
        let me = local("a", "Ann");
        let gate = ActionGate::new(&store, &me, Some("Bob"));
        assert!(!gate.can_vote_for("Cid"));
        assert!(!gate.can_vote_for("Bob"));
    }

    #[test]
    fn host_gates_follow_phase() {
        let me = local("a", "Ann");
        let cases = [
            (Phase::Lobby, true, false, false),
            (Phase::Playing, false, true, false),
            (Phase::Voting, false, false, false),
            (Phase::Ended, false, false, true),
        ];
        for (phase, start, open, restart) in cases {
            let store = store_with(phase, "a", four_alive());
            let gate = ActionGate::new(&store, &me, None);
            assert_eq!(gate.can_start_game(), start, "{phase}");
            assert_eq!(gate.can_open_voting(), open, "{phase}");
            assert_eq!(gate.can_restart_round(), restart, "{phase}");
        }
    }

    #[test]
    fn host_gates_false_for_non_host() {
        for phase in [Phase::Lobby, Phase::Playing, Phase::Voting, Phase::Ended] {
            let store = store_with(phase, "a", four_alive());
            for id in ["b", "c", "d", "zz"] {
                let me = local(id, "Someone");
                let gate = ActionGate::new(&store, &me, None);
                assert!(!gate.can_start_game());
                assert!(!gate.can_open_voting());
                assert!(!gate.can_restart_round());
            }
        }
    }

    #[test]
    fn unconfirmed_connection_is_never_host() {
        let store = store_with(Phase::Lobby, "a", four_alive());
        let me = LocalIdentity::new("Ann");
        let gate = ActionGate::new(&store, &me, None);
        assert!(!gate.can_start_game());
    }
}
