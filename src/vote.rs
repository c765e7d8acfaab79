//! One-shot vote choice for the local player.
//!
//! A selection is recorded at most once per voting round and is only ever
//! cleared by the room leaving the voting phase. Because the gate refuses a
//! vote while a selection exists, repeated clicks produce no further intent.

use tracing::debug;

use crate::gate::{ActionGate, LocalIdentity};
use crate::session::{PhaseTransition, SessionStateStore};

#[derive(Debug, Clone, Default)]
pub struct VoteSelectionTracker {
    selected: Option<String>,
}

impl VoteSelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `target` as this round's choice if the gate allows it.
    ///
    /// Returns `true` when the selection was recorded and a vote intent
    /// should be sent; `false` means nothing changed.
    pub fn select(
        &mut self,
        store: &SessionStateStore,
        local: &LocalIdentity,
        target: &str,
    ) -> bool {
        if !self.gate(store, local).can_vote_for(target) {
            debug!(name = target, "vote selection refused by gate");
            return false;
        }
        debug!(name = target, "vote selection recorded");
        self.selected = Some(target.to_owned());
        true
    }

    /// The action gate as seen with this tracker's current selection.
    pub fn gate<'a>(
        &'a self,
        store: &'a SessionStateStore,
        local: &'a LocalIdentity,
    ) -> ActionGate<'a> {
        ActionGate::new(store, local, self.selected())
    }

    pub fn on_transition(&mut self, transition: &PhaseTransition) {
        if transition.outside_voting() {
            self.selected = None;
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
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
    use crate::protocol::{Phase, Player, RoomSnapshot};

    fn voting_store() -> SessionStateStore {
        let mut store = SessionStateStore::new();
        store.apply_snapshot(RoomSnapshot {
            room_code: "ROOM1".into(),
            phase: Phase::Voting,
            host_id: Some("a".into()),
            players: ["Ann", "Bob", "Cid"]
                .iter()
                .enumerate()
                .map(|(i, name)| Player {
                    id: format!("id{i}").into(),
                    name: (*name).into(),
                    alive: true,
                    score: 0,
                })
                .collect(),
            message: None,
        });
        store
    }

    #[test]
    fn second_selection_in_round_is_refused() {
        let store = voting_store();
        let me = LocalIdentity::new("Ann");
        let mut tracker = VoteSelectionTracker::new();

        assert!(tracker.select(&store, &me, "Bob"));
        assert!(!tracker.select(&store, &me, "Cid"));
        assert!(!tracker.select(&store, &me, "Bob"));
        assert!(!tracker.gate(&store, &me).can_vote_for("Cid"));
        assert_eq!(tracker.selected(), Some("Bob"));
    }

    #[test]
    fn refused_target_leaves_selection_empty() {
        let store = voting_store();
        let me = LocalIdentity::new("Ann");
        let mut tracker = VoteSelectionTracker::new();
        assert!(!tracker.select(&store, &me, "Ann"));
        assert_eq!(tracker.selected(), None);
    }

    #[test]
    fn cleared_whenever_outside_voting() {
        let mut tracker = VoteSelectionTracker {
            selected: Some("Bob".into()),
        };
        tracker.on_transition(&PhaseTransition {
            from: Some(Phase::Voting),
            to: Phase::Voting,
        });
        assert_eq!(tracker.selected(), Some("Bob"));

        tracker.on_transition(&PhaseTransition {
            from: Some(Phase::Voting),
            to: Phase::Ended,
        });
        assert_eq!(tracker.selected(), None);
    }
}
