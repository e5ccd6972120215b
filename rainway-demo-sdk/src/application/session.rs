use crate::application::diagnostics::{StatsRecorder, TransferCounters};
use crate::application::{AcceptPolicy, EventDispatcher, SdkLogSink};
use crate::error::{Result, SdkError};
use crate::infrastructure::{
    Connector, PeerHandle, PeerOf, Runtime, RuntimeOptions, StreamHandle, StreamOf,
};
use rainway_demo_core::application::runtime::DEFAULT_QUEUE_SIZE;
use rainway_demo_core::{
    CommandSender, DataChannelMode, DemoCommand, DemoConfig, DemoEvent, DemoLoop, DemoState,
    InputLevel, PeerId, PeerOrigin, RosterError, SessionState, StreamAnnouncement,
    StreamControl, Timestamp, CHAT_CHANNEL,
};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Max queued SDK commands applied per poll
const POLL_BATCH_SIZE: usize = 64;

/// Minimum spacing of transport statistics samples
const STATS_INTERVAL_MS: u64 = 1000;

type Command<C> = DemoCommand<PeerOf<C>, StreamOf<C>>;
type Event<C> = DemoEvent<PeerOf<C>, StreamOf<C>>;

/// Outcome of one [`DemoSession::poll`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Queued SDK commands applied
    pub processed: usize,
    /// Peers that gained a live handle without an outbound attempt; the caller
    /// should drive [`DemoSession::await_ready`] for each of them
    pub awaiting_ready: Vec<PeerId>,
}

/// Orchestrates one demo session on top of an SDK [`Connector`]
///
/// All state lives in the reducer owned by the inner [`DemoLoop`]. Methods take
/// `&self` so a single `Rc<DemoSession<_>>` can be shared by UI callbacks; no
/// borrow is held across an await point.
pub struct DemoSession<C: Connector> {
    connector: C,
    config: DemoConfig,
    policy: AcceptPolicy,
    runtime: RefCell<Option<Rc<C::Runtime>>>,
    demo: RefCell<DemoLoop<PeerOf<C>, StreamOf<C>>>,
    connecting: Cell<bool>,
    awaiting_ready: RefCell<Vec<PeerId>>,
    counters: TransferCounters,
    stats: RefCell<Option<StatsRecorder<TransferCounters>>>,
    last_report: RefCell<Option<String>>,
}

impl<C: Connector> DemoSession<C> {
    pub fn new(connector: C, config: DemoConfig) -> Self {
        Self {
            connector,
            config,
            policy: AcceptPolicy::AutoAccept,
            runtime: RefCell::new(None),
            demo: RefCell::new(DemoLoop::new(POLL_BATCH_SIZE, DEFAULT_QUEUE_SIZE)),
            connecting: Cell::new(false),
            awaiting_ready: RefCell::new(Vec::new()),
            counters: TransferCounters::new(),
            stats: RefCell::new(None),
            last_report: RefCell::new(None),
        }
    }

    /// How inbound connection requests are answered
    pub fn with_policy(mut self, policy: AcceptPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    pub fn policy(&self) -> &AcceptPolicy {
        &self.policy
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Current runtime, if a session is established
    pub fn runtime(&self) -> Option<Rc<C::Runtime>> {
        self.runtime.borrow().clone()
    }

    /// Handle for enqueueing commands from outside the SDK callbacks
    pub fn sender(&self) -> CommandSender<PeerOf<C>, StreamOf<C>> {
        self.demo.borrow().sender()
    }

    /// Read the current state without cloning it
    pub fn with_state<R>(&self, f: impl FnOnce(&DemoState<PeerOf<C>, StreamOf<C>>) -> R) -> R {
        f(self.demo.borrow().state())
    }

    /// Owned copy of the current state for rendering
    pub fn snapshot(&self) -> DemoState<PeerOf<C>, StreamOf<C>> {
        self.demo.borrow().event_loop().snapshot()
    }

    pub fn session_state(&self) -> SessionState {
        self.with_state(|state| state.session())
    }

    /// Last transport statistics report, rendered when the session closed
    pub fn stats_report(&self) -> Option<String> {
        self.last_report.borrow().clone()
    }

    /// Create the runtime and connect to the gateway
    ///
    /// With an existing runtime this only re-asserts the gateway connection.
    pub async fn connect(&self, api_key: &str) -> Result<()> {
        if let Some(runtime) = self.runtime() {
            tracing::debug!("Runtime exists, re-asserting gateway connection");
            if let Err(e) = runtime.connect_to_gateway().await {
                return self.fail_session(e);
            }
            return Ok(());
        }

        if self.connecting.replace(true) {
            return Err(SdkError::ConnectInFlight);
        }
        let result = self.open_session(api_key).await;
        self.connecting.set(false);
        result
    }

    async fn open_session(&self, api_key: &str) -> Result<()> {
        self.apply(DemoCommand::SessionConnecting)?;

        let handlers = EventDispatcher::new(
            self.sender(),
            self.policy.clone(),
            SdkLogSink::from_config(&self.config),
        )
        .with_counters(self.counters.clone())
        .into_handlers();

        let options = RuntimeOptions {
            api_key: api_key.to_string(),
            external_id: self.config.external_id.clone(),
            minimum_log_level: self.config.minimum_log_level,
        };

        let runtime = match self.connector.initialize(options, handlers).await {
            Ok(runtime) => runtime,
            Err(e) => return self.fail_session(e),
        };

        if let Err(e) = runtime.connect_to_gateway().await {
            return self.fail_session(e);
        }

        if self.session_state() != SessionState::Connecting {
            // Disconnected while the runtime was being built
            runtime.disconnect_from_gateway();
            return Err(SdkError::Rejected(
                "Session was closed while connecting".to_string(),
            ));
        }

        let own_peer_id = runtime.peer_id();
        *self.runtime.borrow_mut() = Some(Rc::new(runtime));
        self.apply(DemoCommand::SessionConnected { own_peer_id })?;
        self.start_stats();

        tracing::info!("🌐 Connected to gateway as {}", own_peer_id);
        Ok(())
    }

    fn fail_session<T>(&self, error: SdkError) -> Result<T> {
        self.apply(DemoCommand::SessionFailed {
            reason: error.display_message(),
        })?;
        Err(error)
    }

    /// Close every peer and drop the runtime
    pub fn disconnect(&self) {
        tracing::info!("👋 Disconnecting from gateway");
        // The rollback releases peers and shuts the runtime down via `settle`
        if let Err(e) = self.apply(DemoCommand::SessionEnded { reason: None }) {
            tracing::warn!("Disconnect was not applied: {}", e);
        }
        self.shutdown_runtime();
    }

    /// Parse user input and connect to the peer it names
    pub async fn connect_to_peer_input(&self, input: &str) -> Result<PeerId> {
        let peer_id: PeerId = input.parse()?;
        self.connect_to_peer(peer_id).await?;
        Ok(peer_id)
    }

    /// One connection attempt; resolves once the peer's stream readiness is known
    pub async fn connect_to_peer(&self, peer_id: PeerId) -> Result<()> {
        let runtime = self.runtime().ok_or(SdkError::NoSession)?;
        self.apply(DemoCommand::PeerConnecting { peer_id })?;

        let peer = match runtime.connect(peer_id).await {
            Ok(peer) => peer,
            Err(e) => return self.fail_connect(peer_id, e),
        };

        if let Err(e) = peer
            .create_data_channel(CHAT_CHANNEL, DataChannelMode::Reliable)
            .await
        {
            peer.disconnect();
            return self.fail_connect(peer_id, e);
        }

        let announcements = match peer.list_streams().await {
            Ok(announcements) => announcements,
            Err(e) => {
                tracing::warn!("Could not list streams of {}: {}", peer_id, e);
                Vec::new()
            }
        };

        // The peer may have dialed us while this attempt was in flight
        let (still_wanted, adopted) = self.with_state(|state| {
            let roster = state.roster();
            (
                roster.is_pending(peer_id),
                roster.get(peer_id).is_some_and(|entry| entry.is_online()),
            )
        });

        if !still_wanted {
            tracing::info!("Dropping late connection to {}", peer_id);
            if !adopted {
                peer.disconnect();
            }
            return Err(SdkError::Rejected(format!(
                "Connection attempt to {} was cancelled",
                peer_id
            )));
        }

        self.apply(DemoCommand::PeerConnected {
            peer_id,
            peer,
            origin: PeerOrigin::Outbound,
            announcements,
        })?;

        if adopted {
            // Readiness is already tracked through the inbound connection
            tracing::info!("🤝 Peer {} was already connected", peer_id);
            return Ok(());
        }
        tracing::info!("🤝 Connected to peer {}", peer_id);

        // Readiness of outbound peers is awaited right here
        self.awaiting_ready.borrow_mut().retain(|id| *id != peer_id);
        self.await_ready(peer_id).await
    }

    fn fail_connect<T>(&self, peer_id: PeerId, error: SdkError) -> Result<T> {
        self.apply(DemoCommand::PeerConnectFailed {
            peer_id,
            reason: error.display_message(),
        })?;
        Err(error)
    }

    /// Wait for the peer's stream readiness and record the outcome
    pub async fn await_ready(&self, peer_id: PeerId) -> Result<()> {
        let peer = self.peer(peer_id)?;

        let command = match peer.ready_to_stream().await {
            Ok(()) => DemoCommand::PeerReady { peer_id },
            Err(e) => {
                tracing::warn!("Peer {} cannot stream: {}", peer_id, e);
                DemoCommand::PeerCannotStream { peer_id }
            }
        };
        self.apply(command)
    }

    /// Best effort; a connection that still resolves is dropped
    pub fn cancel_connection_attempt(&self, peer_id: PeerId) -> Result<()> {
        if let Some(runtime) = self.runtime() {
            runtime.cancel_connection_attempt(peer_id);
        }
        self.apply(DemoCommand::PeerConnectCancelled { peer_id })
    }

    /// Release the peer; its entry and chat history stay for a reconnect
    pub fn disconnect_from_peer(&self, peer_id: PeerId) -> Result<()> {
        self.apply(DemoCommand::DisconnectPeer { peer_id })
    }

    /// Release the peer and drop its entry
    pub fn remove_peer(&self, peer_id: PeerId) -> Result<()> {
        self.apply(DemoCommand::RemovePeer { peer_id })
    }

    /// Request the peer's default stream with full input
    pub async fn request_stream(&self, peer_id: PeerId) -> Result<()> {
        let peer = self.peer(peer_id)?;
        self.apply(DemoCommand::StreamRequested { peer_id })?;

        let result = peer.request_stream(InputLevel::ALL).await;
        self.finish_stream_request(peer_id, result)
    }

    /// Join one of the streams the peer announced
    pub async fn join_announced_stream(
        &self,
        peer_id: PeerId,
        announcement: &StreamAnnouncement,
    ) -> Result<()> {
        let peer = self.peer(peer_id)?;
        self.apply(DemoCommand::StreamRequested { peer_id })?;

        let result = peer.join_stream(announcement, InputLevel::ALL).await;
        self.finish_stream_request(peer_id, result)
    }

    fn finish_stream_request(
        &self,
        peer_id: PeerId,
        result: Result<StreamOf<C>>,
    ) -> Result<()> {
        match result {
            Ok(stream) => {
                let stream_id = stream.id();
                if self.config.log_video_stats {
                    stream.set_stats_overlay(true);
                }
                self.apply(DemoCommand::StreamStarted {
                    peer_id,
                    stream_id,
                    stream,
                })
            }
            Err(e) => {
                self.apply(DemoCommand::StreamRequestFailed {
                    peer_id,
                    reason: e.display_message(),
                })?;
                Err(e)
            }
        }
    }

    /// Detach and leave the active stream; a no-op without one
    pub fn release_stream(&self, peer_id: PeerId) -> Result<()> {
        self.apply(DemoCommand::ReleaseStream { peer_id })
    }

    pub fn stream_control(&self, peer_id: PeerId, control: StreamControl) -> Result<()> {
        let stream = self.with_state(|state| {
            state
                .roster()
                .get(peer_id)
                .and_then(|entry| entry.stream())
                .map(|active| active.handle.clone())
        });
        let stream = stream.ok_or_else(|| {
            SdkError::Rejected(format!("Peer {} has no active stream", peer_id))
        })?;

        match control {
            StreamControl::Fullscreen => stream.request_fullscreen()?,
            StreamControl::Pause => stream.pause(),
            StreamControl::Play => stream.play(),
            StreamControl::StatsOverlay(enabled) => stream.set_stats_overlay(enabled),
            StreamControl::Gestures(enabled) => stream.set_gestures(enabled),
        }
        Ok(())
    }

    /// Send a chat message on the reliable channel and log it
    pub fn send_chat(&self, peer_id: PeerId, message: &str) -> Result<()> {
        if message.is_empty() {
            return Ok(());
        }

        let peer = self.peer(peer_id)?;
        peer.send(CHAT_CHANNEL, message.as_bytes())?;
        self.counters.add_sent(message.len());

        self.apply(DemoCommand::ChatSent {
            peer_id,
            message: message.to_string(),
        })
    }

    /// Apply queued SDK commands and perform the resulting SDK calls
    pub fn poll(&self) -> PollReport {
        let (processed, events) = {
            let mut demo = self.demo.borrow_mut();
            let processed = demo.poll();
            (processed, demo.drain_events())
        };
        self.settle(events);
        self.record_stats();

        PollReport {
            processed,
            awaiting_ready: self.awaiting_ready.take(),
        }
    }

    fn peer(&self, peer_id: PeerId) -> Result<PeerOf<C>> {
        self.with_state(|state| match state.roster().get(peer_id) {
            Some(entry) => entry
                .peer()
                .cloned()
                .ok_or(RosterError::NotConnected(peer_id)),
            None => Err(RosterError::PeerNotFound(peer_id)),
        })
        .map_err(SdkError::from)
    }

    /// Apply a command right away; fails if the reducer rejected it
    fn apply(&self, command: Command<C>) -> Result<()> {
        let (earlier, own) = {
            let mut demo = self.demo.borrow_mut();
            let own = demo.apply(command);
            (demo.drain_events(), own)
        };
        self.settle(earlier);

        let failure = own.iter().find_map(|event| match event {
            DemoEvent::CommandFailed { reason, .. } => Some(reason.clone()),
            _ => None,
        });
        self.settle(own);

        match failure {
            Some(reason) => Err(SdkError::Rejected(reason)),
            None => Ok(()),
        }
    }

    /// Perform the SDK calls the reducer's events ask for
    fn settle(&self, events: Vec<Event<C>>) {
        for event in events {
            match event {
                DemoEvent::StreamReleased {
                    peer_id,
                    stream,
                    reason,
                } => {
                    stream.handle.detach();
                    if reason.requires_leave() {
                        stream.handle.leave();
                    }
                    tracing::debug!("Stream {} of {} released ({:?})", stream.id, peer_id, reason);
                }
                DemoEvent::PeerReleased {
                    peer_id,
                    peer,
                    reason,
                } => {
                    if reason.requires_disconnect() {
                        peer.disconnect();
                    }
                    tracing::debug!("Peer {} released ({:?})", peer_id, reason);
                }
                DemoEvent::WidgetStateChanged { peer_id, from, to }
                    if !from.has_peer() && to.has_peer() =>
                {
                    self.awaiting_ready.borrow_mut().push(peer_id);
                }
                DemoEvent::SessionStateChanged {
                    to: SessionState::Disconnected,
                    ..
                } => self.shutdown_runtime(),
                DemoEvent::PeerErrorLogged { peer_id, reason } => {
                    tracing::warn!("⚠️ Peer {} reported: {}", peer_id, reason);
                }
                DemoEvent::CommandFailed { command, reason } => {
                    tracing::warn!("{} failed: {}", command, reason);
                }
                DemoEvent::CommandIgnored { command, reason } => {
                    tracing::debug!("{} ignored: {}", command, reason);
                }
                _ => {}
            }
        }
    }

    fn shutdown_runtime(&self) {
        let runtime = self.runtime.borrow_mut().take();
        if let Some(runtime) = runtime {
            runtime.disconnect_from_gateway();
            tracing::info!("Runtime {} shut down", runtime.peer_id());
        }
        self.awaiting_ready.borrow_mut().clear();
        self.close_stats();
    }

    fn start_stats(&self) {
        if self.config.log_transport_stats {
            *self.stats.borrow_mut() = Some(StatsRecorder::new(self.counters.clone()));
        }
    }

    fn record_stats(&self) {
        let mut stats = self.stats.borrow_mut();
        if let Some(recorder) = stats.as_mut() {
            let due = recorder
                .samples()
                .last()
                .map_or(true, |last| {
                    last.at_ms + STATS_INTERVAL_MS <= Timestamp::now().as_millis()
                });
            if due {
                recorder.record();
            }
        }
    }

    fn close_stats(&self) {
        let recorder = self.stats.borrow_mut().take();
        if let Some(mut recorder) = recorder {
            let report = recorder.close();
            tracing::info!("📊 {}", report);
            *self.last_report.borrow_mut() = Some(report);
        }
    }
}

impl<C: Connector> fmt::Debug for DemoSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemoSession")
            .field("session", &self.session_state())
            .field("has_runtime", &self.runtime.borrow().is_some())
            .field("connecting", &self.connecting.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::{MockConnector, MockHost, MockNetwork};
    use rainway_demo_core::{ChatKind, StreamId, WidgetState};

    type Session = DemoSession<MockConnector>;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn session(network: &MockNetwork) -> Session {
        init_tracing();
        let config = DemoConfig::default().with_external_id("test-demo");
        DemoSession::new(MockConnector::new(network.clone()), config)
    }

    async fn connected(network: &MockNetwork) -> Session {
        let session = session(network);
        session.connect("pk_test_abc").await.unwrap();
        session
    }

    fn state_of(session: &Session, id: u64) -> WidgetState {
        session.with_state(|s| s.roster().get(PeerId::new(id)).unwrap().state())
    }

    #[tokio::test]
    async fn test_connect_session() {
        let network = MockNetwork::new();
        let session = connected(&network).await;

        assert_eq!(session.session_state(), SessionState::Connected);
        assert!(session.runtime().is_some());
        let own = session.with_state(|s| s.own_peer_id()).unwrap();
        assert_eq!(
            session.with_state(|s| s.status_line()),
            format!("Connected as {}", own)
        );
    }

    #[tokio::test]
    async fn test_invalid_api_key() {
        let network = MockNetwork::new();
        let session = session(&network);

        let result = session.connect("not-a-key").await;

        assert!(matches!(result, Err(SdkError::Initialization(_))));
        assert_eq!(session.session_state(), SessionState::Disconnected);
        assert_eq!(
            session.with_state(|s| s.session_error().map(str::to_string)),
            Some("Invalid API key".to_string())
        );
        assert!(session.runtime().is_none());
    }

    #[tokio::test]
    async fn test_connect_chat_scenario() {
        let network = MockNetwork::new();
        network.add_host(PeerId::new(42));
        let session = connected(&network).await;

        session.connect_to_peer(PeerId::new(42)).await.unwrap();

        session.with_state(|s| {
            assert_eq!(s.roster().len(), 1);
            assert!(s.roster().get(PeerId::new(42)).unwrap().chat_history().is_empty());
        });
        assert_eq!(state_of(&session, 42), WidgetState::ConnectedReadyToStream);
        assert_eq!(
            network.data_channels(PeerId::new(42)),
            vec![(CHAT_CHANNEL.to_string(), DataChannelMode::Reliable)]
        );

        session.send_chat(PeerId::new(42), "hi").unwrap();

        let history =
            session.with_state(|s| s.roster().get(PeerId::new(42)).unwrap().chat_history().to_vec());
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind(), ChatKind::Outgoing);
        assert_eq!(history[0].message(), "hi");

        let sent = network.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel, CHAT_CHANNEL);
        assert_eq!(sent[0].text(), "hi");
    }

    #[tokio::test]
    async fn test_connect_without_session() {
        let network = MockNetwork::new();
        let session = session(&network);

        let result = session.connect_to_peer(PeerId::new(42)).await;
        assert!(matches!(result, Err(SdkError::NoSession)));
    }

    #[tokio::test]
    async fn test_connect_failure_creates_no_entry() {
        let network = MockNetwork::new();
        let session = connected(&network).await;

        let result = session.connect_to_peer(PeerId::new(7)).await;

        assert!(matches!(result, Err(SdkError::PeerConnection(_))));
        session.with_state(|s| {
            assert!(s.roster().is_empty());
            assert_eq!(
                s.roster().connect_error(PeerId::new(7)),
                Some("Peer 7 not found")
            );
        });
    }

    #[tokio::test]
    async fn test_invalid_peer_input() {
        let network = MockNetwork::new();
        let session = connected(&network).await;

        let result = session.connect_to_peer_input("abc").await;
        assert!(matches!(result, Err(SdkError::InvalidPeerId(_))));
    }

    #[tokio::test]
    async fn test_concurrent_attempts_rejected() {
        let network = MockNetwork::new();
        network.add_host_with(
            PeerId::new(42),
            MockHost {
                manual_connect: true,
                ..Default::default()
            },
        );
        let session = connected(&network).await;

        let (first, second, ()) = futures::join!(
            session.connect_to_peer(PeerId::new(42)),
            session.connect_to_peer(PeerId::new(42)),
            async { network.complete_connect(PeerId::new(42)) },
        );

        assert!(first.is_ok());
        assert!(matches!(second, Err(SdkError::Rejected(_))));
        assert_eq!(session.with_state(|s| s.roster().len()), 1);
    }

    #[tokio::test]
    async fn test_cancelled_attempt_drops_late_peer() {
        let network = MockNetwork::new();
        network.add_host_with(
            PeerId::new(42),
            MockHost {
                manual_connect: true,
                ..Default::default()
            },
        );
        let session = connected(&network).await;

        let (result, cancelled) = futures::join!(session.connect_to_peer(PeerId::new(42)), async {
            let cancelled = session.cancel_connection_attempt(PeerId::new(42));
            network.complete_connect(PeerId::new(42));
            cancelled
        });

        assert!(cancelled.is_ok());
        assert!(result.is_err());
        assert!(session.with_state(|s| s.roster().is_empty()));
        assert_eq!(network.cancelled_attempts(), vec![PeerId::new(42)]);
        assert_eq!(network.disconnect_count(PeerId::new(42)), 1);
    }

    #[tokio::test]
    async fn test_inbound_connection_during_outbound_attempt() {
        let network = MockNetwork::new();
        network.add_host_with(
            PeerId::new(42),
            MockHost {
                manual_connect: true,
                ..Default::default()
            },
        );
        let session = connected(&network).await;
        let own = session.with_state(|s| s.own_peer_id()).unwrap();

        let (result, ()) = futures::join!(session.connect_to_peer(PeerId::new(42)), async {
            assert!(network.request_connection(PeerId::new(42), own));
            session.poll();
            network.complete_connect(PeerId::new(42));
        });

        assert!(result.is_ok(), "{:?}", result);
        assert_eq!(network.disconnect_count(PeerId::new(42)), 0);
        assert!(network.is_linked(own, PeerId::new(42)));
        assert!(session.with_state(|s| !s.roster().has_pending()));
        assert!(state_of(&session, 42) >= WidgetState::ConnectedNoStream);
        assert!(session.send_chat(PeerId::new(42), "hi").is_ok());
        assert!(session.with_state(|s| s.roster().invariants_hold()));
    }

    #[tokio::test]
    async fn test_peer_that_cannot_stream() {
        let network = MockNetwork::new();
        network.add_host_with(
            PeerId::new(42),
            MockHost {
                can_stream: false,
                ..Default::default()
            },
        );
        let session = connected(&network).await;

        session.connect_to_peer(PeerId::new(42)).await.unwrap();

        assert_eq!(state_of(&session, 42), WidgetState::ConnectedCantStream);
        assert!(session.request_stream(PeerId::new(42)).await.is_err());
    }

    #[tokio::test]
    async fn test_stream_release_is_idempotent() {
        let network = MockNetwork::new();
        network.add_host(PeerId::new(42));
        let session = connected(&network).await;
        session.connect_to_peer(PeerId::new(42)).await.unwrap();

        session.request_stream(PeerId::new(42)).await.unwrap();
        assert_eq!(state_of(&session, 42), WidgetState::Streaming);

        session.release_stream(PeerId::new(42)).unwrap();
        session.release_stream(PeerId::new(42)).unwrap();

        let streams = network.streams();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].snapshot().left, 1);
        assert_eq!(streams[0].snapshot().detached, 1);
        assert_eq!(state_of(&session, 42), WidgetState::ConnectedReadyToStream);
    }

    #[tokio::test]
    async fn test_second_stream_request_rejected() {
        let network = MockNetwork::new();
        network.add_host(PeerId::new(42));
        let session = connected(&network).await;
        session.connect_to_peer(PeerId::new(42)).await.unwrap();
        session.request_stream(PeerId::new(42)).await.unwrap();

        let result = session.request_stream(PeerId::new(42)).await;

        assert!(matches!(result, Err(SdkError::Rejected(_))));
        assert_eq!(network.streams().len(), 1);
    }

    #[tokio::test]
    async fn test_sdk_stream_stop() {
        let network = MockNetwork::new();
        network.add_host(PeerId::new(42));
        let session = connected(&network).await;
        session.connect_to_peer(PeerId::new(42)).await.unwrap();
        session.request_stream(PeerId::new(42)).await.unwrap();

        network.stop_streams(PeerId::new(42));
        session.poll();

        let stream = network.streams().remove(0).snapshot();
        assert_eq!(stream.detached, 1);
        assert_eq!(stream.left, 0);
        assert_eq!(state_of(&session, 42), WidgetState::ConnectedReadyToStream);
        session.with_state(|s| {
            let entry = s.roster().get(PeerId::new(42)).unwrap();
            assert_eq!(entry.stream_stop_count(), 1);
            assert!(entry.stream().is_none());
        });
    }

    #[tokio::test]
    async fn test_join_announced_stream() {
        let network = MockNetwork::new();
        let announcement = StreamAnnouncement::new(StreamId::new(), Some("Desktop".to_string()));
        network.add_host_with(
            PeerId::new(42),
            MockHost {
                announcements: vec![announcement.clone()],
                ..Default::default()
            },
        );
        let session = connected(&network).await;
        session.connect_to_peer(PeerId::new(42)).await.unwrap();

        let listed = session.with_state(|s| {
            s.roster()
                .get(PeerId::new(42))
                .unwrap()
                .announcements()
                .to_vec()
        });
        assert_eq!(listed, vec![announcement.clone()]);

        session
            .join_announced_stream(PeerId::new(42), &announcement)
            .await
            .unwrap();
        assert_eq!(state_of(&session, 42), WidgetState::Streaming);
    }

    #[tokio::test]
    async fn test_stream_controls() {
        let network = MockNetwork::new();
        network.add_host(PeerId::new(42));
        let session = connected(&network).await;
        session.connect_to_peer(PeerId::new(42)).await.unwrap();

        assert!(session
            .stream_control(PeerId::new(42), StreamControl::Pause)
            .is_err());

        session.request_stream(PeerId::new(42)).await.unwrap();
        session
            .stream_control(PeerId::new(42), StreamControl::Pause)
            .unwrap();
        session
            .stream_control(PeerId::new(42), StreamControl::StatsOverlay(true))
            .unwrap();
        session
            .stream_control(PeerId::new(42), StreamControl::Fullscreen)
            .unwrap();

        let stream = network.streams().remove(0).snapshot();
        assert!(stream.paused);
        assert!(stream.stats_overlay);
        assert!(stream.fullscreen);
    }

    #[tokio::test]
    async fn test_video_stats_overlay_from_config() {
        let network = MockNetwork::new();
        network.add_host(PeerId::new(42));
        let config = DemoConfig {
            log_video_stats: true,
            ..Default::default()
        };
        let session = DemoSession::new(MockConnector::new(network.clone()), config);
        session.connect("pk_test_abc").await.unwrap();
        session.connect_to_peer(PeerId::new(42)).await.unwrap();

        session.request_stream(PeerId::new(42)).await.unwrap();

        assert!(network.streams().remove(0).snapshot().stats_overlay);
    }

    #[tokio::test]
    async fn test_incoming_message_after_poll() {
        let network = MockNetwork::new();
        network.add_host(PeerId::new(42));
        let session = connected(&network).await;
        session.connect_to_peer(PeerId::new(42)).await.unwrap();

        session.send_chat(PeerId::new(42), "hello").unwrap();
        network.send_from(PeerId::new(42), b"hi");
        assert_eq!(session.poll().processed, 1);

        let history =
            session.with_state(|s| s.roster().get(PeerId::new(42)).unwrap().chat_history().to_vec());
        let log: Vec<_> = history.iter().map(|e| (e.kind(), e.message())).collect();
        assert_eq!(
            log,
            vec![(ChatKind::Outgoing, "hello"), (ChatKind::Incoming, "hi")]
        );
    }

    #[tokio::test]
    async fn test_inbound_peer_awaits_readiness() {
        let network = MockNetwork::new();
        network.add_host(PeerId::new(5));
        let session = connected(&network).await;
        let own = session.runtime().unwrap().peer_id();

        assert!(network.request_connection(PeerId::new(5), own));
        let report = session.poll();

        assert_eq!(report.awaiting_ready, vec![PeerId::new(5)]);
        assert_eq!(state_of(&session, 5), WidgetState::ConnectedNoStream);

        session.await_ready(PeerId::new(5)).await.unwrap();
        assert_eq!(state_of(&session, 5), WidgetState::ConnectedReadyToStream);
    }

    #[tokio::test]
    async fn test_prompt_policy_rejects_inbound() {
        let network = MockNetwork::new();
        network.add_host(PeerId::new(5));
        let session = session(&network).with_policy(AcceptPolicy::prompt(|_| false));
        session.connect("pk_test_abc").await.unwrap();
        let own = session.runtime().unwrap().peer_id();

        assert!(!network.request_connection(PeerId::new(5), own));
        session.poll();

        assert!(session.with_state(|s| s.roster().is_empty()));
    }

    #[tokio::test]
    async fn test_disconnect_keeps_entry_for_reconnect() {
        let network = MockNetwork::new();
        network.add_host(PeerId::new(42));
        let session = connected(&network).await;
        session.connect_to_peer(PeerId::new(42)).await.unwrap();
        session.request_stream(PeerId::new(42)).await.unwrap();

        session.disconnect_from_peer(PeerId::new(42)).unwrap();

        assert_eq!(state_of(&session, 42), WidgetState::Disconnected);
        assert_eq!(network.disconnect_count(PeerId::new(42)), 1);
        assert_eq!(network.streams()[0].snapshot().left, 1);

        session.connect_to_peer(PeerId::new(42)).await.unwrap();

        assert_eq!(session.with_state(|s| s.roster().len()), 1);
        assert_eq!(state_of(&session, 42), WidgetState::ConnectedReadyToStream);
        let infos: Vec<String> = session.with_state(|s| {
            s.roster()
                .get(PeerId::new(42))
                .unwrap()
                .chat_history()
                .iter()
                .filter(|e| e.kind() == ChatKind::Info)
                .map(|e| e.message().to_string())
                .collect()
        });
        assert_eq!(
            infos,
            vec!["Disconnected from peer 42", "Reconnected to peer 42"]
        );
    }

    #[tokio::test]
    async fn test_remote_disconnect() {
        let network = MockNetwork::new();
        network.add_host(PeerId::new(42));
        let session = connected(&network).await;
        session.connect_to_peer(PeerId::new(42)).await.unwrap();

        network.drop_peer(PeerId::new(42));
        session.poll();

        assert_eq!(state_of(&session, 42), WidgetState::Disconnected);
        assert_eq!(network.disconnect_count(PeerId::new(42)), 0);
        assert!(session.send_chat(PeerId::new(42), "anyone?").is_err());
    }

    #[tokio::test]
    async fn test_gateway_loss_rolls_back() {
        let network = MockNetwork::new();
        let session = connected(&network).await;
        for id in [1, 2, 3] {
            network.add_host(PeerId::new(id));
            session.connect_to_peer(PeerId::new(id)).await.unwrap();
        }
        assert_eq!(session.with_state(|s| s.roster().len()), 3);

        network.lose_gateway();
        session.poll();

        assert_eq!(session.session_state(), SessionState::Disconnected);
        assert!(session.runtime().is_none());
        session.with_state(|s| {
            assert!(s.roster().is_empty());
            assert_eq!(s.session_error(), Some("Gateway connection lost"));
        });
    }

    #[tokio::test]
    async fn test_disconnect_releases_everything() {
        let network = MockNetwork::new();
        network.add_host(PeerId::new(42));
        let session = connected(&network).await;
        session.connect_to_peer(PeerId::new(42)).await.unwrap();
        session.request_stream(PeerId::new(42)).await.unwrap();

        session.disconnect();

        assert_eq!(session.session_state(), SessionState::Disconnected);
        assert!(session.runtime().is_none());
        assert!(session.with_state(|s| s.roster().is_empty()));
        assert_eq!(network.disconnect_count(PeerId::new(42)), 1);
        assert_eq!(network.streams()[0].snapshot().left, 1);

        // A fresh session can be opened afterwards
        session.connect("pk_test_abc").await.unwrap();
        assert_eq!(session.session_state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_disconnect_twice_is_harmless() {
        let network = MockNetwork::new();
        let session = connected(&network).await;

        session.disconnect();
        session.disconnect();

        assert_eq!(session.session_state(), SessionState::Disconnected);
        assert!(session.runtime().is_none());
        assert!(session.with_state(|s| s.session_error().is_none()));
    }

    #[tokio::test]
    async fn test_second_connect_reuses_runtime() {
        let network = MockNetwork::new();
        let session = connected(&network).await;

        session.connect("pk_test_abc").await.unwrap();

        assert_eq!(network.runtime_ids().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_stats_report() {
        let network = MockNetwork::new();
        network.add_host(PeerId::new(42));
        let config = DemoConfig {
            log_transport_stats: true,
            ..Default::default()
        };
        let session = DemoSession::new(MockConnector::new(network.clone()), config);
        session.connect("pk_test_abc").await.unwrap();
        session.connect_to_peer(PeerId::new(42)).await.unwrap();

        session.send_chat(PeerId::new(42), "12345").unwrap();
        network.send_from(PeerId::new(42), b"abc");
        session.poll();
        session.disconnect();

        let report = session.stats_report().unwrap();
        assert!(report.starts_with("Transport statistics"));
        assert!(report.contains("total: received 3 bytes, sent 5 bytes"));
    }

    #[tokio::test]
    async fn test_peer_error_is_not_fatal() {
        let network = MockNetwork::new();
        network.add_host(PeerId::new(42));
        let session = connected(&network).await;
        session.connect_to_peer(PeerId::new(42)).await.unwrap();

        network.raise_peer_error(PeerId::new(42), "ICE restart");
        session.poll();

        assert_eq!(state_of(&session, 42), WidgetState::ConnectedReadyToStream);
        assert_eq!(session.session_state(), SessionState::Connected);
    }
}
