//! Private role/word reveal for the local player.
//!
//! The reveal arrives on its own channel, independent of snapshot timing, so
//! it is cached separately from the public room state. It survives the
//! `ended` phase (the end-of-round summary still shows it) and is dropped
//! only when the room enters the lobby for a new round.

use tracing::debug;

use crate::protocol::{Role, RoleReveal};
use crate::session::PhaseTransition;

#[derive(Debug, Clone, Default)]
pub struct PrivateRoleCache {
    reveal: Option<RoleReveal>,
}

impl PrivateRoleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly delivered reveal, replacing any earlier one.
    pub fn reveal(&mut self, reveal: RoleReveal) {
        debug!(has_role = reveal.role.is_some(), "role revealed");
        self.reveal = Some(reveal);
    }

    pub fn on_transition(&mut self, transition: &PhaseTransition) {
        if transition.entered_lobby() && self.reveal.take().is_some() {
            debug!("role reveal cleared for new round");
        }
    }

    pub fn current(&self) -> Option<&RoleReveal> {
        self.reveal.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.reveal.as_ref().and_then(|r| r.role)
    }

    pub fn word(&self) -> Option<&str> {
        self.reveal.as_ref().and_then(|r| r.word.as_deref())
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
    use crate::protocol::Phase;

    fn undercover() -> RoleReveal {
        RoleReveal {
            role: Some(Role::Undercover),
            word: Some("Shadow".into()),
        }
    }

    fn edge(from: Option<Phase>, to: Phase) -> PhaseTransition {
        PhaseTransition { from, to }
    }

    #[test]
    fn reveal_survives_end_of_round() {
        let mut cache = PrivateRoleCache::new();
        cache.reveal(undercover());
        cache.on_transition(&edge(Some(Phase::Voting), Phase::Ended));
        assert_eq!(cache.role(), Some(Role::Undercover));
        assert_eq!(cache.word(), Some("Shadow"));
    }

    #[test]
    fn entering_lobby_clears_reveal() {
        let mut cache = PrivateRoleCache::new();
        cache.reveal(undercover());
        cache.on_transition(&edge(Some(Phase::Ended), Phase::Lobby));
        assert!(cache.current().is_none());
    }

    #[test]
    fn lobby_refresh_keeps_early_reveal() {
        let mut cache = PrivateRoleCache::new();
        cache.reveal(undercover());
        cache.on_transition(&edge(Some(Phase::Lobby), Phase::Lobby));
        assert_eq!(cache.role(), Some(Role::Undercover));
    }

    #[test]
    fn later_reveal_replaces_earlier() {
        let mut cache = PrivateRoleCache::new();
        cache.reveal(undercover());
        cache.reveal(RoleReveal {
            role: Some(Role::Civilian),
            word: None,
        });
        assert_eq!(cache.role(), Some(Role::Civilian));
        assert_eq!(cache.word(), None);
    }
}
