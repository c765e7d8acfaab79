//! # Terminal Lobby Demo
//!
//! Joins an Undercover room from the terminal and logs what a player would
//! see: the room state, the scoreboard, the vote tally and the private role.
//! When the local player is host, the demo starts the game, opens voting and
//! restarts rounds on its own; during voting it votes for the first eligible
//! player.
//!
//! ## Running
//!
//! ```sh
//! # Start a room server on localhost:3000, then:
//! cargo run --example terminal_lobby -- AB12C Ann
//!
//! # Override the server URL:
//! UNDERCOVER_SERVER_URL=ws://my-server:3000/ws cargo run --example terminal_lobby -- AB12C Ann
//! ```

use undercover_client::protocol::Phase;
use undercover_client::{ClientConfig, ConnectionManager, RoomEvent, RoomSession};

/// Default server URL when `UNDERCOVER_SERVER_URL` is not set.
const DEFAULT_URL: &str = "ws://localhost:3000/ws";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let url = std::env::var("UNDERCOVER_SERVER_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    let mut args = std::env::args().skip(1);
    let room = args.next().unwrap_or_default();
    let name = args.next().unwrap_or_default();

    let config = ClientConfig::new().with_connect_timeout(std::time::Duration::from_secs(5));
    let mut manager = ConnectionManager::new(config);

    // ── Connect ─────────────────────────────────────────────────────
    tracing::info!("Connecting to {url}");
    let session = match manager.connect_websocket(&url, &room, &name).await {
        Ok(session) => session,
        Err(undercover_client::UndercoverError::InvalidVisit { reason }) => {
            eprintln!("{reason}\nusage: terminal_lobby <ROOM> <NAME>");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // ── Event loop ──────────────────────────────────────────────────
    loop {
        tokio::select! {
            event = session.next_event() => {
                let Some(event) = event else {
                    tracing::info!("Session ended, exiting");
                    break;
                };

                match event {
                    RoomEvent::Connected { connection_id } => {
                        tracing::info!("Connected as {connection_id}, joining room…");
                    }

                    RoomEvent::StateUpdated { transition } => {
                        if transition.is_change() {
                            tracing::info!("Phase → {}", transition.to);
                        }
                        if transition.entered_voting() {
                            tracing::info!("Voting is open");
                        }
                        report_room(session);
                        act_as_player(session)?;
                    }

                    RoomEvent::VotesUpdated => {
                        for (target, count) in session.mirror().store().tally() {
                            tracing::info!("  {target}: {count} vote(s)");
                        }
                    }

                    RoomEvent::RoleRevealed => {
                        report_role(session);
                    }

                    RoomEvent::Notice { message } => {
                        tracing::warn!("Server says: {message}");
                    }

                    RoomEvent::Disconnected { reason } => {
                        tracing::warn!("Disconnected: {}", reason.as_deref().unwrap_or("server closed"));
                        break;
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, leaving room");
                break;
            }
        }
    }

    // ── Leave ───────────────────────────────────────────────────────
    manager.leave().await;
    tracing::info!("Left the room");

    Ok(())
}

fn report_room(session: &RoomSession) {
    let mirror = session.mirror();
    let store = mirror.store();

    let host = store.host().map(|p| p.name.as_str()).unwrap_or("nobody");
    tracing::info!(
        "Room {} ({} alive, host: {host}{})",
        store.room_code().unwrap_or("?"),
        store.alive_count(),
        if mirror.is_host() { ", that's you" } else { "" }
    );
    if let Some(message) = store.message() {
        tracing::info!("» {message}");
    }

    if mirror.phase() == Some(Phase::Ended) {
        for (rank, player) in store.scoreboard().iter().enumerate() {
            tracing::info!("  {}. {}: {} pt(s)", rank + 1, player.name, player.score);
        }
    } else {
        for player in store.players() {
            let status = if player.alive { "" } else { " (out)" };
            tracing::info!("  {}{status}", player.name);
        }
    }

    report_role(session);
}

fn report_role(session: &RoomSession) {
    if let Some(reveal) = session.mirror().visible_role() {
        let role = reveal
            .role
            .map(|r| format!("{r:?}"))
            .unwrap_or_else(|| "unknown".into());
        tracing::info!(
            "Your role: {role}, your word: {}",
            reveal.word.as_deref().unwrap_or("?")
        );
    }
}

/// Take whichever action the gates currently allow.
fn act_as_player(session: &mut RoomSession) -> Result<(), undercover_client::UndercoverError> {
    if session.start_game()? {
        tracing::info!("Host: starting the game");
    } else if session.open_voting()? {
        tracing::info!("Host: opening the vote");
    } else if session.restart_round()? {
        tracing::info!("Host: back to the lobby");
    }

    let target = session
        .mirror()
        .selectable_targets()
        .first()
        .map(|p| p.name.clone());
    if let Some(target) = target {
        if session.vote(&target)? {
            tracing::info!("Voted for {target}");
        }
    }
    Ok(())
}
