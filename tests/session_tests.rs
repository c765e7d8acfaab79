//! End-to-end session tests for the Undercover client.
//!
//! Drives a real `RoomSession` through the scripted transport in
//! `tests/common`, checking mirror state, gate decisions and exactly which
//! intents reach the wire.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]

mod common;

use undercover_client::protocol::{ClientMessage, Phase, Role};
use undercover_client::{ClientConfig, ConnectionManager, RoomEvent, UndercoverError};

use common::{
    deliver, error, four_players, joined_session, player, role, scripted, settle, state,
    state_with_message, votes,
};

// ════════════════════════════════════════════════════════════════════
// Joining
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn join_sent_once_per_connection() {
    let (mut session, server) = joined_session("Ann", "a").await;
    deliver(&mut session, &server, state(Phase::Lobby, "a", four_players())).await;
    settle().await;

    let joins: Vec<_> = server
        .sent_messages()
        .into_iter()
        .filter(|m| matches!(m, ClientMessage::JoinRoom { .. }))
        .collect();
    assert_eq!(
        joins,
        vec![ClientMessage::JoinRoom {
            room: "ROOM1".into(),
            name: "Ann".into()
        }]
    );

    session.shutdown().await;
}

#[tokio::test]
async fn host_in_lobby_may_start_but_not_vote() {
    let (mut session, server) = joined_session("Ann", "A").await;
    deliver(
        &mut session,
        &server,
        state(Phase::Lobby, "A", vec![player("A", "Ann", true, 0)]),
    )
    .await;

    let mirror = session.mirror();
    assert!(mirror.can_start_game());
    assert!(mirror.store().players().iter().all(|p| !mirror.can_cast_vote(p)));
    assert!(mirror.selectable_targets().is_empty());

    assert!(session.start_game().unwrap());
    settle().await;
    assert_eq!(server.sent_messages().last(), Some(&ClientMessage::StartGame));

    session.shutdown().await;
}

#[tokio::test]
async fn loading_until_first_snapshot() {
    let (mut session, server) = joined_session("Ann", "a").await;
    assert!(session.mirror().is_loading());
    assert!(!session.start_game().unwrap());

    deliver(&mut session, &server, state(Phase::Lobby, "a", four_players())).await;
    assert!(!session.mirror().is_loading());

    session.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Voting
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn repeated_clicks_send_one_vote() {
    let (mut session, server) = joined_session("Ann", "a").await;
    deliver(&mut session, &server, state(Phase::Voting, "a", four_players())).await;

    assert!(session.vote("Bob").unwrap());
    assert!(!session.vote("Bob").unwrap());
    assert!(!session.vote("Cid").unwrap());
    settle().await;

    assert_eq!(server.votes_sent(), 1);
    assert_eq!(
        server.sent_messages().last(),
        Some(&ClientMessage::Vote {
            room: "ROOM1".into(),
            voted_name: "Bob".into()
        })
    );
    assert_eq!(session.mirror().selection(), Some("Bob"));

    session.shutdown().await;
}

#[tokio::test]
async fn self_vote_is_refused_silently() {
    let (mut session, server) = joined_session("Ann", "a").await;
    deliver(&mut session, &server, state(Phase::Voting, "a", four_players())).await;

    assert!(!session.vote("Ann").unwrap());
    settle().await;
    assert_eq!(server.votes_sent(), 0);
    assert_eq!(session.mirror().selection(), None);

    session.shutdown().await;
}

#[tokio::test]
async fn two_alive_round_offers_no_targets() {
    let (mut session, server) = joined_session("Ann", "a").await;
    let players = vec![
        player("a", "Ann", true, 0),
        player("b", "Bob", true, 0),
        player("c", "Cid", false, 0),
    ];

    deliver(&mut session, &server, state(Phase::Voting, "a", players.clone())).await;
    assert!(session.mirror().selectable_targets().is_empty());
    assert!(!session.vote("Bob").unwrap());

    deliver(&mut session, &server, votes(&[])).await;
    assert!(session.mirror().selectable_targets().is_empty());

    deliver(&mut session, &server, state(Phase::Ended, "a", players)).await;
    assert!(session.mirror().selectable_targets().is_empty());
    settle().await;
    assert_eq!(server.votes_sent(), 0);

    session.shutdown().await;
}

#[tokio::test]
async fn selection_only_exists_while_voting() {
    let (mut session, server) = joined_session("Ann", "a").await;
    let sequence = [
        Phase::Lobby,
        Phase::Playing,
        Phase::Voting,
        Phase::Voting,
        Phase::Ended,
        Phase::Lobby,
        Phase::Playing,
        Phase::Voting,
        Phase::Ended,
    ];

    for phase in sequence {
        deliver(&mut session, &server, state(phase, "a", four_players())).await;
        // Try to vote at every step; only voting phases can accept it.
        let _ = session.vote("Dee").unwrap();
        let selection = session.mirror().selection();
        if phase == Phase::Voting {
            assert_eq!(selection, Some("Dee"));
        } else {
            assert_eq!(selection, None, "selection leaked into {phase}");
        }
    }

    settle().await;
    // One vote per voting round, two rounds.
    assert_eq!(server.votes_sent(), 2);

    session.shutdown().await;
}

#[tokio::test]
async fn tally_tracks_votes_and_resets_after_round() {
    let (mut session, server) = joined_session("Ann", "a").await;
    deliver(&mut session, &server, state(Phase::Voting, "a", four_players())).await;

    let event = deliver(&mut session, &server, votes(&[("Bob", 2), ("Cid", 1)])).await;
    assert_eq!(event, RoomEvent::VotesUpdated);
    assert_eq!(session.mirror().store().votes_for("Bob"), 2);

    deliver(&mut session, &server, votes(&[("Cid", 3)])).await;
    assert_eq!(session.mirror().store().votes_for("Bob"), 0);
    assert_eq!(session.mirror().store().votes_for("Cid"), 3);

    deliver(&mut session, &server, state(Phase::Ended, "a", four_players())).await;
    assert!(session.mirror().store().tally().is_empty());

    session.shutdown().await;
}

#[tokio::test]
async fn tally_reads_empty_outside_voting() {
    let (mut session, server) = joined_session("Ann", "a").await;

    // Before the first snapshot.
    deliver(&mut session, &server, votes(&[("Bob", 1)])).await;
    assert!(session.mirror().store().tally().is_empty());

    deliver(&mut session, &server, state(Phase::Voting, "a", four_players())).await;
    deliver(&mut session, &server, votes(&[("Bob", 2)])).await;
    assert_eq!(session.mirror().store().votes_for("Bob"), 2);

    // A late tally after the round ended.
    deliver(&mut session, &server, state(Phase::Ended, "a", four_players())).await;
    deliver(&mut session, &server, votes(&[("Bob", 2)])).await;
    assert!(session.mirror().store().tally().is_empty());
    assert_eq!(session.mirror().store().votes_for("Bob"), 0);

    deliver(&mut session, &server, state(Phase::Lobby, "a", four_players())).await;
    deliver(&mut session, &server, votes(&[("Cid", 1)])).await;
    assert!(session.mirror().store().tally().is_empty());

    session.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Host gates
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn host_gates_follow_host_change_within_one_update() {
    let (mut session, server) = joined_session("Ann", "a").await;
    deliver(&mut session, &server, state(Phase::Playing, "a", four_players())).await;
    assert!(session.mirror().can_open_voting());

    deliver(&mut session, &server, state(Phase::Playing, "b", four_players())).await;
    assert!(!session.mirror().can_open_voting());
    assert!(!session.open_voting().unwrap());

    deliver(&mut session, &server, state(Phase::Playing, "a", four_players())).await;
    assert!(session.open_voting().unwrap());
    settle().await;
    assert_eq!(
        server.sent_messages().last(),
        Some(&ClientMessage::StartVoting {
            room: "ROOM1".into()
        })
    );

    session.shutdown().await;
}

#[tokio::test]
async fn non_host_never_sends_host_intents() {
    let (mut session, server) = joined_session("Bob", "b").await;
    for phase in [Phase::Lobby, Phase::Playing, Phase::Voting, Phase::Ended] {
        deliver(&mut session, &server, state(phase, "a", four_players())).await;
        assert!(!session.start_game().unwrap());
        assert!(!session.open_voting().unwrap());
        assert!(!session.restart_round().unwrap());
    }
    settle().await;

    let host_intents = server
        .sent_messages()
        .into_iter()
        .filter(|m| {
            matches!(
                m,
                ClientMessage::StartGame
                    | ClientMessage::StartVoting { .. }
                    | ClientMessage::PlayAgain { .. }
            )
        })
        .count();
    assert_eq!(host_intents, 0);

    session.shutdown().await;
}

#[tokio::test]
async fn reconnection_with_new_id_rejoins_and_recomputes_host() {
    let (mut session, server) = joined_session("Ann", "a").await;
    deliver(&mut session, &server, state(Phase::Ended, "a", four_players())).await;
    assert!(session.mirror().can_restart_round());

    // Same player, new connection identifier; server still lists the old one.
    let event = deliver(&mut session, &server, common::connected("a2")).await;
    assert_eq!(
        event,
        RoomEvent::Connected {
            connection_id: "a2".into()
        }
    );
    assert!(!session.mirror().can_restart_round());

    let mut players = four_players();
    players[0].id = "a2".into();
    deliver(&mut session, &server, state(Phase::Ended, "a2", players)).await;
    assert!(session.restart_round().unwrap());
    settle().await;

    let sent = server.sent_messages();
    let joins = sent
        .iter()
        .filter(|m| matches!(m, ClientMessage::JoinRoom { .. }))
        .count();
    assert_eq!(joins, 2);
    assert_eq!(
        sent.last(),
        Some(&ClientMessage::PlayAgain {
            room: "ROOM1".into()
        })
    );

    session.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Private role
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn reveal_survives_end_and_clears_in_lobby() {
    let (mut session, server) = joined_session("Ann", "a").await;
    deliver(&mut session, &server, state(Phase::Playing, "a", four_players())).await;

    let event = deliver(&mut session, &server, role(Role::Undercover, "Shadow")).await;
    assert_eq!(event, RoomEvent::RoleRevealed);

    deliver(&mut session, &server, state(Phase::Voting, "a", four_players())).await;
    deliver(
        &mut session,
        &server,
        state_with_message(Phase::Ended, "a", four_players(), Some("Civilians win")),
    )
    .await;

    let mirror = session.mirror();
    assert_eq!(mirror.store().message(), Some("Civilians win"));
    let reveal = mirror.visible_role().expect("reveal visible after round end");
    assert_eq!(reveal.role, Some(Role::Undercover));
    assert_eq!(reveal.word.as_deref(), Some("Shadow"));

    deliver(&mut session, &server, state(Phase::Lobby, "a", four_players())).await;
    assert!(session.mirror().role_reveal().is_none());
    assert!(session.mirror().visible_role().is_none());

    session.shutdown().await;
}

#[tokio::test]
async fn reveal_before_round_snapshot_is_shown_once_playing() {
    let (mut session, server) = joined_session("Ann", "a").await;
    deliver(&mut session, &server, state(Phase::Lobby, "a", four_players())).await;
    deliver(&mut session, &server, role(Role::Civilian, "Lamp")).await;
    assert!(session.mirror().visible_role().is_none());

    let event = deliver(&mut session, &server, state(Phase::Playing, "a", four_players())).await;
    match event {
        RoomEvent::StateUpdated { transition } => {
            assert_eq!(transition.from, Some(Phase::Lobby));
            assert_eq!(transition.to, Phase::Playing);
        }
        other => panic!("expected StateUpdated, got {other:?}"),
    }
    assert_eq!(
        session.mirror().visible_role().and_then(|r| r.role),
        Some(Role::Civilian)
    );

    session.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Errors and teardown
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn server_error_is_a_notice_only() {
    let (mut session, server) = joined_session("Ann", "a").await;
    deliver(&mut session, &server, state(Phase::Voting, "a", four_players())).await;
    deliver(&mut session, &server, role(Role::Civilian, "Lamp")).await;
    session.vote("Bob").unwrap();

    let event = deliver(&mut session, &server, error("Vote rejected")).await;
    assert_eq!(
        event,
        RoomEvent::Notice {
            message: "Vote rejected".into()
        }
    );
    assert_eq!(session.mirror().phase(), Some(Phase::Voting));
    assert_eq!(session.mirror().selection(), Some("Bob"));
    assert!(session.mirror().role_reveal().is_some());
    assert!(session.is_connected());

    session.shutdown().await;
}

#[tokio::test]
async fn server_hang_up_ends_session() {
    let (mut session, server) = joined_session("Ann", "a").await;
    server.hang_up();

    let event = session.next_event().await.unwrap();
    assert_eq!(event, RoomEvent::Disconnected { reason: None });
    assert!(session.next_event().await.is_none());
    assert!(matches!(
        session.vote("Bob"),
        Ok(false) | Err(UndercoverError::NotConnected)
    ));

    session.shutdown().await;
}

#[tokio::test]
async fn frames_after_teardown_are_not_applied() {
    let (mut session, server) = joined_session("Ann", "a").await;
    deliver(&mut session, &server, state(Phase::Lobby, "a", four_players())).await;

    session.shutdown().await;
    assert!(server.is_closed());
    assert!(session.next_event().await.is_none());
    assert_eq!(session.mirror().phase(), Some(Phase::Lobby));
}

#[tokio::test]
async fn leave_sends_leave_room_and_closes() {
    let (mut session, server) = joined_session("Ann", "a").await;
    session.leave().await;

    assert!(server.is_closed());
    assert_eq!(server.sent_messages().last(), Some(&ClientMessage::LeaveRoom));
    assert!(!session.is_connected());
}

// ════════════════════════════════════════════════════════════════════
// Connection manager
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn missing_visit_details_never_connect() {
    let mut manager = ConnectionManager::new(ClientConfig::new());
    let mut attempted = false;

    let result = manager
        .connect_with("", "Ann", || {
            attempted = true;
            async {
                let (transport, _server) = scripted();
                Ok(transport)
            }
        })
        .await;

    assert!(matches!(result, Err(UndercoverError::InvalidVisit { .. })));
    assert!(!attempted);
    assert!(manager.session().is_none());
}

#[tokio::test]
async fn new_visit_tears_down_previous_connection() {
    let mut manager = ConnectionManager::new(ClientConfig::new());

    let (first, first_server) = scripted();
    manager
        .connect_with("room1", "Ann", move || async move { Ok(first) })
        .await
        .unwrap();
    assert!(!first_server.is_closed());

    let (second, second_server) = scripted();
    let session = manager
        .connect_with("room2", "Ann", move || async move { Ok(second) })
        .await
        .unwrap();
    assert_eq!(session.visit().room(), "ROOM2");

    assert!(first_server.is_closed());
    assert!(!second_server.is_closed());

    manager.disconnect().await;
    assert!(second_server.is_closed());
    assert!(manager.session().is_none());
}

#[tokio::test]
async fn connector_failure_leaves_no_session() {
    let mut manager = ConnectionManager::new(ClientConfig::new());
    let result = manager
        .connect_with("room1", "Ann", || async {
            Err::<common::ScriptedTransport, _>(UndercoverError::Timeout)
        })
        .await;

    assert!(matches!(result, Err(UndercoverError::Timeout)));
    assert!(manager.session().is_none());
}

#[tokio::test]
async fn manager_leave_sends_leave_room() {
    let mut manager = ConnectionManager::new(ClientConfig::new());
    let (transport, server) = scripted();
    let session = manager
        .connect_with("room1", "Ann", move || async move { Ok(transport) })
        .await
        .unwrap();
    server.push(&common::connected("a"));
    session.next_event().await.unwrap();

    manager.leave().await;

    assert!(server.is_closed());
    assert_eq!(server.sent_messages().last(), Some(&ClientMessage::LeaveRoom));
    assert!(manager.session().is_none());
}
