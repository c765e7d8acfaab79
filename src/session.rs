//! Authoritative room state as mirrored by the client.
//!
//! [`SessionStateStore`] keeps the most recent [`RoomSnapshot`] and vote
//! tally exactly as the server sent them and derives read-only facts from
//! them. Nothing here is ever patched in place: every `state` or `votes`
//! frame replaces the previous value wholesale.
//!
//! Applying a snapshot yields a [`PhaseTransition`], which names the phase
//! edges the rest of the mirror reacts to.

use tracing::debug;

use crate::protocol::{ConnectionId, Phase, Player, RoomSnapshot, VoteTally};

/// The phase edge produced by one snapshot update.
///
/// `from` is `None` for the first snapshot of a room visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: Option<Phase>,
    pub to: Phase,
}

impl PhaseTransition {
    /// `true` when this update moved the room into `phase` from somewhere else.
    pub fn entered(&self, phase: Phase) -> bool {
        self.to == phase && self.from != Some(phase)
    }

    /// A new round is being set up.
    pub fn entered_lobby(&self) -> bool {
        self.entered(Phase::Lobby)
    }

    pub fn entered_voting(&self) -> bool {
        self.entered(Phase::Voting)
    }

    pub fn entered_ended(&self) -> bool {
        self.entered(Phase::Ended)
    }

    /// The room is in any phase other than voting after this update.
    ///
    /// Holds on every such update, not only on the edge, so listeners that
    /// reset on it are idempotent.
    pub fn outside_voting(&self) -> bool {
        self.to != Phase::Voting
    }

    /// The phase actually changed.
    pub fn is_change(&self) -> bool {
        self.from != Some(self.to)
    }
}

/// Latest authoritative snapshot plus tally, with derived read facts.
#[derive(Debug, Clone, Default)]
pub struct SessionStateStore {
    snapshot: Option<RoomSnapshot>,
    tally: VoteTally,
}

impl SessionStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot and report the phase edge it produced.
    ///
    /// Leaving the voting phase also drops the tally.
    pub fn apply_snapshot(&mut self, snapshot: RoomSnapshot) -> PhaseTransition {
        let transition = PhaseTransition {
            from: self.phase(),
            to: snapshot.phase,
        };
        if transition.outside_voting() {
            self.tally.clear();
        }
        if transition.is_change() {
            debug!(from = ?transition.from, to = %transition.to, room = %snapshot.room_code, "phase transition");
        }
        self.snapshot = Some(snapshot);
        transition
    }

    /// Replace the vote tally. `None` is an empty tally.
    ///
    /// A tally arriving while the room is not voting (late after the round
    /// ended, or before the first snapshot) is dropped, so the tally stays
    /// empty outside voting. Returns whether the tally was taken.
    pub fn apply_tally(&mut self, tally: Option<VoteTally>) -> bool {
        if self.phase() != Some(Phase::Voting) {
            debug!(phase = ?self.phase(), "dropping vote tally outside voting");
            self.tally.clear();
            return false;
        }
        self.tally = tally.unwrap_or_default();
        true
    }

    /// `true` until the first snapshot arrives.
    pub fn is_loading(&self) -> bool {
        self.snapshot.is_none()
    }

    pub fn snapshot(&self) -> Option<&RoomSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.snapshot.as_ref().map(|s| s.phase)
    }

    pub fn room_code(&self) -> Option<&str> {
        self.snapshot.as_ref().map(|s| s.room_code.as_str())
    }

    /// Server narrative for the current phase.
    pub fn message(&self) -> Option<&str> {
        self.snapshot.as_ref().and_then(|s| s.message.as_deref())
    }

    /// Players in display order; empty while loading.
    pub fn players(&self) -> &[Player] {
        self.snapshot
            .as_ref()
            .map(|s| s.players.as_slice())
            .unwrap_or(&[])
    }

    pub fn alive_count(&self) -> usize {
        self.players().iter().filter(|p| p.alive).count()
    }

    pub fn host_id(&self) -> Option<&ConnectionId> {
        self.snapshot.as_ref().and_then(|s| s.host_id.as_ref())
    }

    /// Whether `id` is the current host. Recomputed on every call.
    pub fn is_host(&self, id: Option<&ConnectionId>) -> bool {
        matches!((id, self.host_id()), (Some(id), Some(host)) if id == host)
    }

    pub fn host(&self) -> Option<&Player> {
        let host = self.host_id()?;
        self.player_by_id(host)
    }

    pub fn player_by_id(&self, id: &ConnectionId) -> Option<&Player> {
        self.players().iter().find(|p| &p.id == id)
    }

    /// First player carrying `name`. Names are not deduplicated.
    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        self.players().iter().find(|p| p.name == name)
    }

    /// Players sorted by score, highest first. Ties keep display order.
    pub fn scoreboard(&self) -> Vec<&Player> {
        let mut board: Vec<&Player> = self.players().iter().collect();
        board.sort_by(|a, b| b.score.cmp(&a.score));
        board
    }

    /// The current voting round's tally; empty outside voting.
    pub fn tally(&self) -> &VoteTally {
        &self.tally
    }

    /// Votes received by `name` this round.
    pub fn votes_for(&self, name: &str) -> u32 {
        self.tally.get(name).copied().unwrap_or(0)
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

    fn player(id: &str, name: &str, alive: bool, score: u32) -> Player {
        Player {
            id: id.into(),
            name: name.into(),
            alive,
            score,
        }
    }

    fn snapshot(phase: Phase, host: &str, players: Vec<Player>) -> RoomSnapshot {
        RoomSnapshot {
            room_code: "QWERT".into(),
            phase,
            host_id: Some(host.into()),
            players,
            message: None,
        }
    }

    #[test]
    fn empty_store_is_loading() {
        let store = SessionStateStore::new();
        assert!(store.is_loading());
        assert_eq!(store.phase(), None);
        assert!(store.players().is_empty());
        assert_eq!(store.alive_count(), 0);
        assert!(!store.is_host(Some(&"a".into())));
        assert!(store.scoreboard().is_empty());
    }

    #[test]
    fn first_snapshot_transition_has_no_origin() {
        let mut store = SessionStateStore::new();
        let t = store.apply_snapshot(snapshot(Phase::Lobby, "a", vec![]));
        assert_eq!(t.from, None);
        assert!(t.entered_lobby());
        assert!(t.is_change());
        assert!(!store.is_loading());
    }

    #[test]
    fn round_edges_are_reported_once() {
        let mut store = SessionStateStore::new();
        store.apply_snapshot(snapshot(Phase::Playing, "a", vec![]));

        let t = store.apply_snapshot(snapshot(Phase::Voting, "a", vec![]));
        assert!(t.entered_voting());
        assert!(!t.outside_voting());
        let t = store.apply_snapshot(snapshot(Phase::Voting, "a", vec![]));
        assert!(!t.entered_voting());

        let t = store.apply_snapshot(snapshot(Phase::Ended, "a", vec![]));
        assert!(t.entered_ended());
        assert!(!t.entered_lobby());
        assert!(t.outside_voting());
    }

    #[test]
    fn tally_outside_voting_is_dropped() {
        let mut store = SessionStateStore::new();
        let bob = || Some(VoteTally::from([("Bob".to_string(), 2)]));

        // Before the first snapshot.
        assert!(!store.apply_tally(bob()));
        assert!(store.tally().is_empty());

        store.apply_snapshot(snapshot(Phase::Voting, "a", vec![]));
        assert!(store.apply_tally(bob()));
        assert_eq!(store.votes_for("Bob"), 2);

        // A late tally after the round ended.
        store.apply_snapshot(snapshot(Phase::Ended, "a", vec![]));
        assert!(!store.apply_tally(bob()));
        assert!(store.tally().is_empty());
        assert_eq!(store.votes_for("Bob"), 0);

        store.apply_snapshot(snapshot(Phase::Lobby, "a", vec![]));
        assert!(!store.apply_tally(Some(VoteTally::from([("Cid".to_string(), 1)]))));
        assert!(store.tally().is_empty());
    }

    #[test]
    fn repeated_phase_is_not_an_entry() {
        let mut store = SessionStateStore::new();
        store.apply_snapshot(snapshot(Phase::Lobby, "a", vec![]));
        let t = store.apply_snapshot(snapshot(Phase::Lobby, "a", vec![]));
        assert!(!t.entered_lobby());
        assert!(!t.is_change());
        assert!(t.outside_voting());
    }

    #[test]
    fn scoreboard_is_stable_descending() {
        let mut store = SessionStateStore::new();
        store.apply_snapshot(snapshot(
            Phase::Ended,
            "a",
            vec![
                player("a", "Ann", true, 1),
                player("b", "Bob", true, 3),
                player("c", "Cid", false, 1),
                player("d", "Dee", true, 3),
            ],
        ));
        let names: Vec<&str> = store.scoreboard().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Bob", "Dee", "Ann", "Cid"]);
        // Display order is untouched.
        assert_eq!(store.players()[0].name, "Ann");
    }

    #[test]
    fn host_is_derived_from_current_snapshot() {
        let mut store = SessionStateStore::new();
        let a: ConnectionId = "a".into();
        let players = vec![player("a", "Ann", true, 0), player("b", "Bob", true, 0)];
        store.apply_snapshot(snapshot(Phase::Lobby, "a", players.clone()));
        assert!(store.is_host(Some(&a)));
        assert_eq!(store.host().unwrap().name, "Ann");

        store.apply_snapshot(snapshot(Phase::Lobby, "b", players));
        assert!(!store.is_host(Some(&a)));
        assert_eq!(store.host().unwrap().name, "Bob");
        assert!(!store.is_host(None));
    }

    #[test]
    fn tally_cleared_when_round_ends() {
        let mut store = SessionStateStore::new();
        store.apply_snapshot(snapshot(Phase::Voting, "a", vec![]));
        store.apply_tally(Some(VoteTally::from([("Bob".to_string(), 2)])));
        assert_eq!(store.votes_for("Bob"), 2);
        assert_eq!(store.votes_for("Ann"), 0);

        store.apply_snapshot(snapshot(Phase::Ended, "a", vec![]));
        assert!(store.tally().is_empty());
    }

    #[test]
    fn null_tally_is_empty() {
        let mut store = SessionStateStore::new();
        store.apply_snapshot(snapshot(Phase::Voting, "a", vec![]));
        store.apply_tally(Some(VoteTally::from([("Bob".to_string(), 1)])));
        store.apply_tally(None);
        assert!(store.tally().is_empty());
    }

    #[test]
    fn alive_count_ignores_eliminated() {
        let mut store = SessionStateStore::new();
        store.apply_snapshot(snapshot(
            Phase::Playing,
            "a",
            vec![
                player("a", "Ann", true, 0),
                player("b", "Bob", false, 0),
                player("c", "Cid", true, 0),
            ],
        ));
        assert_eq!(store.alive_count(), 2);
        assert_eq!(store.player_by_name("Bob").unwrap().id, ConnectionId::from("b"));
    }
}
