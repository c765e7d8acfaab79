//! Async session handle for one room visit.
//!
//! [`RoomSession`] owns the [`RoomMirror`] and talks to a background
//! transport loop task over two channels: an unbounded command channel for
//! outbound intents and a bounded channel for inbound frames. The mirror is
//! only touched from the task that owns the session (in
//! [`next_event`](RoomSession::next_event) and the intent methods), so it
//! needs no lock.
//!
//! # Example
//!
//! ```rust,ignore
//! let visit = RoomVisit::new("ab12c", "Ann")?;
//! let transport = connect_somehow().await;
//! let mut session = RoomSession::start(transport, visit, ClientConfig::new());
//!
//! while let Some(event) = session.next_event().await {
//!     match event {
//!         RoomEvent::StateUpdated { .. } if session.mirror().can_start_game() => {
//!             session.start_game()?;
//!         }
//!         RoomEvent::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::connection::RoomVisit;
use crate::dispatch::IntentDispatcher;
use crate::error::{Result, UndercoverError};
use crate::event::RoomEvent;
use crate::mirror::RoomMirror;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::transport::Transport;

/// Default capacity of the bounded inbound channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

// ── Configuration ───────────────────────────────────────────────────

/// Tuning for a [`RoomSession`].
///
/// # Example
///
/// ```
/// use undercover_client::client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new()
///     .with_event_channel_capacity(64)
///     .with_shutdown_timeout(Duration::from_millis(500))
///     .with_connect_timeout(Duration::from_secs(5));
/// assert_eq!(config.event_channel_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Capacity of the bounded channel carrying inbound frames from the
    /// transport loop to the session.
    ///
    /// When the consumer falls behind, the loop waits for room instead of
    /// dropping frames: a lost `role` frame could never be recovered.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// How long [`RoomSession::shutdown`] waits for the transport loop to
    /// close the transport before aborting it.
    ///
    /// Defaults to **1 second**.
    pub shutdown_timeout: Duration,
    /// Deadline for establishing a transport through
    /// [`ConnectionManager::connect_websocket`](crate::connection::ConnectionManager::connect_websocket).
    /// `None` waits indefinitely.
    pub connect_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            connect_timeout: None,
        }
    }

    /// Defaults to **256**. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// A zero timeout aborts the transport loop without waiting.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ── Loop → session channel ──────────────────────────────────────────

#[derive(Debug)]
enum LoopEvent {
    Message(ServerMessage),
    Closed { reason: Option<String> },
}

// ── Session handle ──────────────────────────────────────────────────

/// One live room visit: the local mirror plus its transport connection.
///
/// The connection is released on every exit path: [`leave`](Self::leave),
/// [`shutdown`](Self::shutdown), the server closing, or dropping the
/// session (which aborts the loop task).
pub struct RoomSession {
    visit: RoomVisit,
    mirror: RoomMirror,
    dispatcher: IntentDispatcher,
    inbound_rx: mpsc::Receiver<LoopEvent>,
    /// Cleared by the loop when the transport goes away.
    connected: Arc<AtomicBool>,
    /// Set once `Disconnected` was yielded or the session was torn down.
    finished: bool,
    task: Option<tokio::task::JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_timeout: Duration,
}

impl RoomSession {
    /// Spawn the transport loop for `visit` over an established transport.
    ///
    /// The loop answers every `connected` greeting from the server with a
    /// `join-room` intent for the visit.
    #[must_use = "dropping the session tears the connection down"]
    pub fn start(transport: impl Transport, visit: RoomVisit, config: ClientConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let capacity = config.event_channel_capacity.max(1);
        let (inbound_tx, inbound_rx) = mpsc::channel::<LoopEvent>(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let connected = Arc::new(AtomicBool::new(true));

        info!(room = visit.room(), name = visit.name(), "starting room session");

        let task = tokio::spawn(transport_loop(
            transport,
            visit.clone(),
            cmd_rx,
            inbound_tx,
            Arc::clone(&connected),
            shutdown_rx,
        ));

        Self {
            mirror: RoomMirror::new(visit.name()),
            dispatcher: IntentDispatcher::new(visit.room(), cmd_tx),
            visit,
            inbound_rx,
            connected,
            finished: false,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        }
    }

    /// Wait for the next inbound message, apply it to the mirror and report
    /// what changed.
    ///
    /// Returns `None` after [`RoomEvent::Disconnected`] has been yielded or
    /// the session was shut down. Cancel-safe.
    pub async fn next_event(&mut self) -> Option<RoomEvent> {
        if self.finished {
            return None;
        }
        match self.inbound_rx.recv().await {
            Some(LoopEvent::Message(msg)) => Some(self.mirror.apply(msg)),
            Some(LoopEvent::Closed { reason }) => {
                self.finish();
                Some(RoomEvent::Disconnected { reason })
            }
            None => {
                self.finish();
                None
            }
        }
    }

    // ── Intents ─────────────────────────────────────────────────────

    /// Vote for `target` if that is currently legal.
    ///
    /// Returns `Ok(false)` (and sends nothing) when the gate refuses, which
    /// includes every click after the first one in a round.
    ///
    /// # Errors
    ///
    /// Returns [`UndercoverError::NotConnected`] if the visit has ended.
    pub fn vote(&mut self, target: &str) -> Result<bool> {
        if !self.mirror.gate().can_vote_for(target) {
            debug!(target_name = target, "vote not allowed");
            return Ok(false);
        }
        self.ensure_connected()?;
        // Latch the selection only once the intent is queued, so a visit
        // that ended under us leaves the round open.
        self.dispatcher.vote(target)?;
        Ok(self.mirror.select_vote(target))
    }

    /// Host only, in the lobby.
    ///
    /// # Errors
    ///
    /// Returns [`UndercoverError::NotConnected`] if the visit has ended.
    pub fn start_game(&self) -> Result<bool> {
        self.gated(
            "startGame",
            self.mirror.can_start_game(),
            IntentDispatcher::start_game,
        )
    }

    /// Host only, while playing.
    ///
    /// # Errors
    ///
    /// Returns [`UndercoverError::NotConnected`] if the visit has ended.
    pub fn open_voting(&self) -> Result<bool> {
        self.gated(
            "start-voting",
            self.mirror.can_open_voting(),
            IntentDispatcher::start_voting,
        )
    }

    /// Host only, once the round has ended.
    ///
    /// # Errors
    ///
    /// Returns [`UndercoverError::NotConnected`] if the visit has ended.
    pub fn restart_round(&self) -> Result<bool> {
        self.gated(
            "play-again",
            self.mirror.can_restart_round(),
            IntentDispatcher::play_again,
        )
    }

    /// Tell the server we are leaving, then tear the connection down.
    ///
    /// The `leaveRoom` intent is flushed before the transport closes. If the
    /// connection is already gone only the local teardown happens.
    pub async fn leave(&mut self) {
        if self.ensure_connected().is_ok() {
            if let Err(e) = self.dispatcher.leave_room() {
                debug!("leave intent not queued: {e}");
            }
        }
        self.shutdown().await;
    }

    /// Close the transport and stop the background task.
    ///
    /// Any inbound frames still buffered are discarded without being applied.
    pub async fn shutdown(&mut self) {
        debug!(room = self.visit.room(), "RoomSession: shutdown requested");
        self.finish();

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("transport loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("transport loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("transport loop aborted: {join_err}");
                    }
                }
            }
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn mirror(&self) -> &RoomMirror {
        &self.mirror
    }

    pub fn visit(&self) -> &RoomVisit {
        &self.visit
    }

    /// Returns `true` while the transport is believed to be connected.
    pub fn is_connected(&self) -> bool {
        !self.finished && self.connected.load(Ordering::Acquire)
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(UndercoverError::NotConnected)
        }
    }

    fn gated(
        &self,
        kind: &'static str,
        allowed: bool,
        send: impl FnOnce(&IntentDispatcher) -> Result<()>,
    ) -> Result<bool> {
        if !allowed {
            debug!(kind, "intent not allowed");
            return Ok(false);
        }
        self.ensure_connected()?;
        send(&self.dispatcher)?;
        Ok(true)
    }

    fn finish(&mut self) {
        self.finished = true;
        self.connected.store(false, Ordering::Release);
        self.inbound_rx.close();
    }
}

impl std::fmt::Debug for RoomSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomSession")
            .field("room", &self.visit.room())
            .field("name", &self.visit.name())
            .field("connected", &self.is_connected())
            .field("phase", &self.mirror.phase())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        // No executor is available here to drive an async close, so abort
        // the loop; dropping its future drops the transport.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Transport loop ──────────────────────────────────────────────────

/// Background loop multiplexing intents, shutdown and inbound frames.
///
/// Exits when:
/// - shutdown is signalled (pending intents are flushed first)
/// - the command channel or the inbound channel closes
/// - the transport returns `None` or an error
async fn transport_loop(
    mut transport: impl Transport,
    visit: RoomVisit,
    mut cmd_rx: mpsc::UnboundedReceiver<ClientMessage>,
    inbound_tx: mpsc::Sender<LoopEvent>,
    connected: Arc<AtomicBool>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    debug!("transport loop started");

    loop {
        tokio::select! {
            // Branch 1: outgoing intent from the session
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(msg) => {
                        if let Err(e) = send_message(&mut transport, &msg).await {
                            error!("transport send error: {e}");
                            emit_closed(&inbound_tx, &connected, Some(format!("transport send error: {e}"))).await;
                            break;
                        }
                    }
                    None => {
                        debug!("command channel closed, shutting down transport loop");
                        let _ = transport.close().await;
                        emit_closed(&inbound_tx, &connected, Some("client shut down".into())).await;
                        break;
                    }
                }
            }

            // Branch 2: shutdown signal
            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                while let Ok(msg) = cmd_rx.try_recv() {
                    if let Err(e) = send_message(&mut transport, &msg).await {
                        warn!("could not flush {} before close: {e}", msg.kind());
                        break;
                    }
                }
                let _ = transport.close().await;
                emit_closed(&inbound_tx, &connected, Some("client shut down".into())).await;
                break;
            }

            // Branch 3: incoming frame from the server
            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => {
                        let server_msg = match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(msg) => msg,
                            Err(e) => {
                                warn!("failed to deserialize server message: {e} (raw: {text})");
                                continue;
                            }
                        };
                        debug!(kind = server_msg.kind(), "received server message");

                        if let ServerMessage::Connected { id } = &server_msg {
                            info!(connection_id = %id, room = visit.room(), "transport confirmed, joining room");
                            let join = ClientMessage::JoinRoom {
                                room: visit.room().to_owned(),
                                name: visit.name().to_owned(),
                            };
                            if let Err(e) = send_message(&mut transport, &join).await {
                                error!("failed to send join-room: {e}");
                                emit_closed(&inbound_tx, &connected, Some(format!("transport send error: {e}"))).await;
                                break;
                            }
                        }

                        if inbound_tx.send(LoopEvent::Message(server_msg)).await.is_err() {
                            debug!("session stopped listening, closing transport");
                            let _ = transport.close().await;
                            connected.store(false, Ordering::Release);
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        error!("transport receive error: {e}");
                        emit_closed(&inbound_tx, &connected, Some(format!("transport receive error: {e}"))).await;
                        break;
                    }
                    None => {
                        info!("transport closed by server");
                        emit_closed(&inbound_tx, &connected, None).await;
                        break;
                    }
                }
            }
        }
    }

    debug!("transport loop exited");
}

async fn send_message(transport: &mut impl Transport, msg: &ClientMessage) -> Result<()> {
    let json = serde_json::to_string(msg)?;
    debug!(kind = msg.kind(), "sending client message");
    transport.send(json).await
}

/// Mark the connection gone and tell the session, if it is still listening.
async fn emit_closed(
    inbound_tx: &mpsc::Sender<LoopEvent>,
    connected: &AtomicBool,
    reason: Option<String>,
) {
    connected.store(false, Ordering::Release);
    if inbound_tx.send(LoopEvent::Closed { reason }).await.is_err() {
        debug!("inbound channel closed, session dropped");
    }
}

// ── Tests ───────────────────────────────────────────────────────────

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
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    // ── Mock transport ──────────────────────────────────────────────

    /// Records sent frames and replays scripted inbound ones.
    struct MockTransport {
        incoming: VecDeque<Option<std::result::Result<String, UndercoverError>>>,
        sent: Arc<StdMutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    impl MockTransport {
        fn new(
            incoming: Vec<Option<std::result::Result<String, UndercoverError>>>,
        ) -> (Self, Arc<StdMutex<Vec<String>>>, Arc<AtomicBool>) {
            let sent = Arc::new(StdMutex::new(Vec::new()));
            let closed = Arc::new(AtomicBool::new(false));
            let transport = Self {
                incoming: VecDeque::from(incoming),
                sent: Arc::clone(&sent),
                closed: Arc::clone(&closed),
            };
            (transport, sent, closed)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&mut self, message: String) -> std::result::Result<(), UndercoverError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, UndercoverError>> {
            if let Some(item) = self.incoming.pop_front() {
                item
            } else {
                std::future::pending().await
            }
        }

        async fn close(&mut self) -> std::result::Result<(), UndercoverError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    fn connected_json(id: &str) -> String {
        serde_json::to_string(&ServerMessage::Connected { id: id.into() }).unwrap()
    }

    fn visit() -> RoomVisit {
        RoomVisit::new("abc12", "Ann").unwrap()
    }

    fn sent_messages(sent: &Arc<StdMutex<Vec<String>>>) -> Vec<ClientMessage> {
        sent.lock()
            .unwrap()
            .iter()
            .map(|s| serde_json::from_str(s).unwrap())
            .collect()
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn greeting_triggers_single_join() {
        let (transport, sent, _closed) = MockTransport::new(vec![Some(Ok(connected_json("s1")))]);
        let mut session = RoomSession::start(transport, visit(), ClientConfig::new());

        let event = session.next_event().await.unwrap();
        assert_eq!(
            event,
            RoomEvent::Connected {
                connection_id: "s1".into()
            }
        );
        assert_eq!(
            sent_messages(&sent),
            vec![ClientMessage::JoinRoom {
                room: "ABC12".into(),
                name: "Ann".into()
            }]
        );

        session.shutdown().await;
    }

    #[tokio::test]
    async fn malformed_frames_are_skipped() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            Some(Ok("not json".into())),
            Some(Ok(r#"{"type":"mystery","data":{}}"#.into())),
            Some(Ok(connected_json("s1"))),
        ]);
        let mut session = RoomSession::start(transport, visit(), ClientConfig::new());

        let event = session.next_event().await.unwrap();
        assert!(matches!(event, RoomEvent::Connected { .. }));

        session.shutdown().await;
    }

    #[tokio::test]
    async fn disconnected_on_transport_close() {
        let (transport, _sent, _closed) =
            MockTransport::new(vec![Some(Ok(connected_json("s1"))), None]);
        let mut session = RoomSession::start(transport, visit(), ClientConfig::new());

        let _ = session.next_event().await; // Connected
        let event = session.next_event().await.unwrap();
        assert_eq!(event, RoomEvent::Disconnected { reason: None });
        assert!(!session.is_connected());
        assert!(session.next_event().await.is_none());

        session.shutdown().await;
    }

    #[tokio::test]
    async fn receive_error_reports_reason() {
        let (transport, _sent, _closed) = MockTransport::new(vec![Some(Err(
            UndercoverError::TransportReceive("boom".into()),
        ))]);
        let mut session = RoomSession::start(transport, visit(), ClientConfig::new());

        match session.next_event().await.unwrap() {
            RoomEvent::Disconnected { reason } => assert!(reason.unwrap().contains("boom")),
            other => panic!("expected Disconnected, got {other:?}"),
        }

        session.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_closes_transport_and_stops_events() {
        let (transport, _sent, closed) = MockTransport::new(vec![Some(Ok(connected_json("s1")))]);
        let mut session = RoomSession::start(transport, visit(), ClientConfig::new());
        let _ = session.next_event().await;

        session.shutdown().await;

        assert!(closed.load(Ordering::Relaxed));
        assert!(!session.is_connected());
        assert!(session.next_event().await.is_none());
    }

    #[tokio::test]
    async fn leave_flushes_intent_before_close() {
        let (transport, sent, closed) = MockTransport::new(vec![Some(Ok(connected_json("s1")))]);
        let mut session = RoomSession::start(transport, visit(), ClientConfig::new());
        let _ = session.next_event().await;

        session.leave().await;

        assert!(closed.load(Ordering::Relaxed));
        assert_eq!(sent_messages(&sent).last(), Some(&ClientMessage::LeaveRoom));
    }

    #[tokio::test]
    async fn intents_after_shutdown_are_not_connected() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            Some(Ok(connected_json("s1"))),
            Some(Ok(serde_json::to_string(&ServerMessage::State(
                crate::protocol::RoomSnapshot {
                    room_code: "ABC12".into(),
                    phase: crate::protocol::Phase::Lobby,
                    host_id: Some("s1".into()),
                    players: vec![],
                    message: None,
                },
            ))
            .unwrap())),
        ]);
        let mut session = RoomSession::start(transport, visit(), ClientConfig::new());
        let _ = session.next_event().await; // Connected
        let _ = session.next_event().await; // StateUpdated
        assert!(session.mirror().can_start_game());

        session.shutdown().await;

        assert!(matches!(
            session.start_game(),
            Err(UndercoverError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn vote_to_dead_loop_leaves_round_open() {
        let state = ServerMessage::State(crate::protocol::RoomSnapshot {
            room_code: "ABC12".into(),
            phase: crate::protocol::Phase::Voting,
            host_id: Some("s1".into()),
            players: ["Ann", "Bob", "Cid"]
                .iter()
                .enumerate()
                .map(|(i, name)| crate::protocol::Player {
                    id: format!("s{}", i + 1).into(),
                    name: (*name).into(),
                    alive: true,
                    score: 0,
                })
                .collect(),
            message: None,
        });
        let (transport, sent, _closed) = MockTransport::new(vec![
            Some(Ok(connected_json("s1"))),
            Some(Ok(serde_json::to_string(&state).unwrap())),
        ]);
        let mut session = RoomSession::start(transport, visit(), ClientConfig::new());
        let _ = session.next_event().await; // Connected
        let _ = session.next_event().await; // StateUpdated

        // The loop dies without clearing the connected flag.
        let task = session.task.take().unwrap();
        task.abort();
        let _ = task.await;
        assert!(session.is_connected());

        assert!(matches!(
            session.vote("Bob"),
            Err(UndercoverError::NotConnected)
        ));
        assert_eq!(session.mirror().selection(), None);
        assert!(session.mirror().gate().can_vote_for("Bob"));
        assert!(!sent_messages(&sent)
            .iter()
            .any(|m| matches!(m, ClientMessage::Vote { .. })));
    }

    #[tokio::test]
    async fn config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
        assert!(config.connect_timeout.is_none());
    }

    #[tokio::test]
    async fn event_channel_capacity_is_clamped_to_one() {
        let config = ClientConfig::new().with_event_channel_capacity(0);
        assert_eq!(config.event_channel_capacity, 1);
    }

    /// Transport that hangs forever in `close()` so the abort path runs.
    struct HangingCloseTransport {
        dropped: Arc<AtomicBool>,
    }

    impl Drop for HangingCloseTransport {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::Release);
        }
    }

    #[async_trait]
    impl Transport for HangingCloseTransport {
        async fn send(&mut self, _message: String) -> std::result::Result<(), UndercoverError> {
            Ok(())
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, UndercoverError>> {
            std::future::pending().await
        }

        async fn close(&mut self) -> std::result::Result<(), UndercoverError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn shutdown_timeout_aborts_stuck_transport_task() {
        let dropped = Arc::new(AtomicBool::new(false));
        let transport = HangingCloseTransport {
            dropped: Arc::clone(&dropped),
        };
        let config = ClientConfig::new().with_shutdown_timeout(Duration::from_millis(20));
        let mut session = RoomSession::start(transport, visit(), config);

        session.shutdown().await;

        assert!(dropped.load(Ordering::Acquire));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn dropping_session_releases_transport() {
        let dropped = Arc::new(AtomicBool::new(false));
        let transport = HangingCloseTransport {
            dropped: Arc::clone(&dropped),
        };
        let session = RoomSession::start(transport, visit(), ClientConfig::new());
        drop(session);

        // Give the runtime a moment to run the aborted task's cleanup.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(dropped.load(Ordering::Acquire));
    }
}
