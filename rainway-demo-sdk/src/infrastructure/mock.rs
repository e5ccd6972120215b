//! In-memory stand-in for the Rainway SDK.
//!
//! A [`MockNetwork`] plays the gateway and the remote hosts. Demo clients
//! obtain runtimes from a [`MockConnector`] bound to the network; tests then
//! drive the remote side (messages, stream stops, disconnects, connection
//! loss) through the network handle.

use crate::application::{ConnectionRequest, EventHandlers};
use crate::error::{Result, SdkError};
use crate::infrastructure::{Connector, PeerHandle, Runtime, RuntimeOptions, StreamHandle};
use async_trait::async_trait;
use futures::channel::oneshot;
use rainway_demo_core::{
    DataChannelMode, InputLevel, PeerId, StreamAnnouncement, StreamId, CHAT_CHANNEL,
};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

/// First id handed to a mock runtime
const FIRST_RUNTIME_ID: u64 = 900_000_000_000_000_001;

/// Behaviour of a simulated remote host
#[derive(Debug, Clone)]
pub struct MockHost {
    pub can_stream: bool,
    pub accepts: bool,
    /// Connection attempts wait for [`MockNetwork::complete_connect`]
    pub manual_connect: bool,
    pub announcements: Vec<StreamAnnouncement>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            can_stream: true,
            accepts: true,
            manual_connect: false,
            announcements: Vec::new(),
        }
    }
}

/// A message a demo client sent to a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub from: PeerId,
    pub to: PeerId,
    pub channel: String,
    pub data: Vec<u8>,
}

impl SentMessage {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

struct RuntimeSlot {
    handlers: EventHandlers<MockPeer, MockStream>,
    online: bool,
}

#[derive(Default)]
struct NetworkState {
    hosts: HashMap<PeerId, MockHost>,
    runtimes: HashMap<PeerId, RuntimeSlot>,
    /// (runtime, host) pairs with a live connection
    links: BTreeSet<(PeerId, PeerId)>,
    pending_connects: HashMap<PeerId, Vec<oneshot::Sender<()>>>,
    sent: Vec<SentMessage>,
    data_channels: Vec<(PeerId, String, DataChannelMode)>,
    streams: Vec<MockStream>,
    disconnects: Vec<PeerId>,
    cancelled: Vec<PeerId>,
    next_runtime_id: u64,
}

/// Shared simulated gateway
#[derive(Clone, Default)]
pub struct MockNetwork {
    state: Rc<RefCell<NetworkState>>,
}

impl fmt::Debug for MockNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MockNetwork")
            .field("hosts", &state.hosts.len())
            .field("runtimes", &state.runtimes.len())
            .field("links", &state.links.len())
            .finish()
    }
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_host(&self, peer_id: PeerId) {
        self.add_host_with(peer_id, MockHost::default());
    }

    pub fn add_host_with(&self, peer_id: PeerId, host: MockHost) {
        self.state.borrow_mut().hosts.insert(peer_id, host);
    }

    pub fn set_can_stream(&self, host: PeerId, can_stream: bool) {
        if let Some(h) = self.state.borrow_mut().hosts.get_mut(&host) {
            h.can_stream = can_stream;
        }
    }

    /// Runtimes registered so far
    pub fn runtime_ids(&self) -> Vec<PeerId> {
        let mut ids: Vec<_> = self.state.borrow().runtimes.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn is_linked(&self, runtime: PeerId, host: PeerId) -> bool {
        self.state.borrow().links.contains(&(runtime, host))
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.state.borrow().sent.clone()
    }

    pub fn data_channels(&self, host: PeerId) -> Vec<(String, DataChannelMode)> {
        self.state
            .borrow()
            .data_channels
            .iter()
            .filter(|(h, _, _)| *h == host)
            .map(|(_, label, mode)| (label.clone(), *mode))
            .collect()
    }

    pub fn streams(&self) -> Vec<MockStream> {
        self.state.borrow().streams.clone()
    }

    /// How often a client called `disconnect` on a handle of `host`
    pub fn disconnect_count(&self, host: PeerId) -> usize {
        self.state
            .borrow()
            .disconnects
            .iter()
            .filter(|h| **h == host)
            .count()
    }

    pub fn cancelled_attempts(&self) -> Vec<PeerId> {
        self.state.borrow().cancelled.clone()
    }

    /// Resolve connection attempts waiting on a manual host
    pub fn complete_connect(&self, host: PeerId) {
        let waiting = self
            .state
            .borrow_mut()
            .pending_connects
            .remove(&host)
            .unwrap_or_default();
        for tx in waiting {
            let _ = tx.send(());
        }
    }

    /// The host sends `data` on the chat channel to every linked client
    pub fn send_from(&self, host: PeerId, data: &[u8]) {
        for handlers in self.linked_handlers(host) {
            (handlers.on_peer_message)(host, CHAT_CHANNEL.to_string(), data.to_vec());
        }
    }

    /// The host offers a new stream
    pub fn announce(&self, host: PeerId, announcement: StreamAnnouncement) {
        if let Some(h) = self.state.borrow_mut().hosts.get_mut(&host) {
            h.announcements.push(announcement.clone());
        }
        for handlers in self.linked_handlers(host) {
            (handlers.on_stream_announcement)(host, announcement.clone());
        }
    }

    /// The host reports a peer-level error
    pub fn raise_peer_error(&self, host: PeerId, error: &str) {
        for handlers in self.linked_handlers(host) {
            (handlers.on_peer_error)(host, error.to_string());
        }
    }

    /// The host ends every stream it is serving
    pub fn stop_streams(&self, host: PeerId) {
        let stopped: Vec<(MockStream, EventHandlers<MockPeer, MockStream>)> = {
            let state = self.state.borrow();
            state
                .streams
                .iter()
                .filter(|s| s.host == host && s.is_active())
                .filter_map(|s| {
                    state
                        .runtimes
                        .get(&s.owner)
                        .map(|slot| (s.clone(), slot.handlers.clone()))
                })
                .collect()
        };

        for (stream, handlers) in stopped {
            stream.inner.borrow_mut().stopped = true;
            (handlers.on_stream_stop)(stream);
        }
    }

    /// The host goes away
    pub fn drop_peer(&self, host: PeerId) {
        let handlers = self.linked_handlers(host);
        self.state.borrow_mut().links.retain(|(_, h)| *h != host);
        for handlers in handlers {
            (handlers.on_peer_disconnect)(host);
        }
    }

    /// The gateway drops every client
    pub fn lose_gateway(&self) {
        let handlers: Vec<_> = {
            let mut state = self.state.borrow_mut();
            state.links.clear();
            state
                .runtimes
                .values_mut()
                .filter(|slot| slot.online)
                .map(|slot| {
                    slot.online = false;
                    slot.handlers.clone()
                })
                .collect()
        };

        for handlers in handlers {
            (handlers.on_connection_lost)(
                "Error: RainwayError: Gateway connection lost".to_string(),
            );
        }
    }

    /// `host` dials the client `runtime`; returns whether the client accepted
    pub fn request_connection(&self, host: PeerId, runtime: PeerId) -> bool {
        let handlers = match self.state.borrow().runtimes.get(&runtime) {
            Some(slot) => slot.handlers.clone(),
            None => return false,
        };

        let accepted = Rc::new(RefCell::new(false));
        let answer = Rc::clone(&accepted);
        let network = self.clone();
        let on_connect = Rc::clone(&handlers.on_peer_connect);

        let request = ConnectionRequest::new(host, move |accept| {
            *answer.borrow_mut() = accept;
            if !accept {
                return;
            }
            network.state.borrow_mut().links.insert((runtime, host));
            let peer = MockPeer {
                local: runtime,
                remote: host,
                network: network.clone(),
            };
            on_connect(peer);
        });

        (handlers.on_connection_request)(request);
        let result = *accepted.borrow();
        result
    }

    fn linked_handlers(&self, host: PeerId) -> Vec<EventHandlers<MockPeer, MockStream>> {
        let state = self.state.borrow();
        state
            .links
            .iter()
            .filter(|(_, h)| *h == host)
            .filter_map(|(runtime, _)| state.runtimes.get(runtime))
            .map(|slot| slot.handlers.clone())
            .collect()
    }

    fn host(&self, peer_id: PeerId) -> Option<MockHost> {
        self.state.borrow().hosts.get(&peer_id).cloned()
    }
}

/// Connector bound to a [`MockNetwork`]
///
/// API keys not starting with `pk_` are rejected the way the real SDK rejects
/// malformed keys.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    network: MockNetwork,
}

impl MockConnector {
    pub fn new(network: MockNetwork) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &MockNetwork {
        &self.network
    }
}

#[async_trait(?Send)]
impl Connector for MockConnector {
    type Runtime = MockRuntime;

    async fn initialize(
        &self,
        options: RuntimeOptions,
        handlers: EventHandlers<MockPeer, MockStream>,
    ) -> Result<MockRuntime> {
        if !options.api_key.starts_with("pk_") {
            return Err(SdkError::Initialization(
                "RainwayError: Invalid API key".to_string(),
            ));
        }

        let mut state = self.network.state.borrow_mut();
        let id = PeerId::new(FIRST_RUNTIME_ID + state.next_runtime_id);
        state.next_runtime_id += 1;
        state.runtimes.insert(
            id,
            RuntimeSlot {
                handlers,
                online: false,
            },
        );

        tracing::debug!("Mock runtime {} created for '{}'", id, options.external_id);

        Ok(MockRuntime {
            id,
            network: self.network.clone(),
        })
    }
}

#[derive(Debug)]
pub struct MockRuntime {
    id: PeerId,
    network: MockNetwork,
}

#[async_trait(?Send)]
impl Runtime for MockRuntime {
    type Peer = MockPeer;

    async fn connect_to_gateway(&self) -> Result<()> {
        match self.network.state.borrow_mut().runtimes.get_mut(&self.id) {
            Some(slot) => {
                slot.online = true;
                Ok(())
            }
            None => Err(SdkError::Gateway("unknown runtime".to_string())),
        }
    }

    fn disconnect_from_gateway(&self) {
        let mut state = self.network.state.borrow_mut();
        if let Some(slot) = state.runtimes.get_mut(&self.id) {
            slot.online = false;
        }
        let id = self.id;
        state.links.retain(|(runtime, _)| *runtime != id);
    }

    async fn connect(&self, peer_id: PeerId) -> Result<MockPeer> {
        let online = self
            .network
            .state
            .borrow()
            .runtimes
            .get(&self.id)
            .is_some_and(|slot| slot.online);
        if !online {
            return Err(SdkError::Gateway("not connected to the gateway".to_string()));
        }

        let host = self.network.host(peer_id).ok_or_else(|| {
            SdkError::PeerConnection(format!("RainwayError: Peer {} not found", peer_id))
        })?;

        if host.manual_connect {
            let (tx, rx) = oneshot::channel();
            self.network
                .state
                .borrow_mut()
                .pending_connects
                .entry(peer_id)
                .or_default()
                .push(tx);
            rx.await.map_err(|_| {
                SdkError::PeerConnection("RainwayError: Connection attempt aborted".to_string())
            })?;
        }

        if !host.accepts {
            return Err(SdkError::PeerConnection(
                "RainwayError: Connection refused".to_string(),
            ));
        }

        self.network
            .state
            .borrow_mut()
            .links
            .insert((self.id, peer_id));

        Ok(MockPeer {
            local: self.id,
            remote: peer_id,
            network: self.network.clone(),
        })
    }

    fn peer_id(&self) -> PeerId {
        self.id
    }

    fn cancel_connection_attempt(&self, peer_id: PeerId) {
        self.network.state.borrow_mut().cancelled.push(peer_id);
    }
}

/// Client-side handle of a connection to a mock host
#[derive(Debug, Clone)]
pub struct MockPeer {
    local: PeerId,
    remote: PeerId,
    network: MockNetwork,
}

impl MockPeer {
    fn ensure_linked(&self) -> Result<MockHost> {
        if !self.network.is_linked(self.local, self.remote) {
            return Err(SdkError::PeerConnection(format!(
                "RainwayError: Peer {} is not connected",
                self.remote
            )));
        }
        self.network.host(self.remote).ok_or_else(|| {
            SdkError::PeerConnection(format!("RainwayError: Peer {} not found", self.remote))
        })
    }

    fn open_stream(&self) -> MockStream {
        let stream = MockStream {
            id: StreamId::new(),
            host: self.remote,
            owner: self.local,
            inner: Rc::new(RefCell::new(MockStreamState::default())),
        };
        self.network.state.borrow_mut().streams.push(stream.clone());
        stream
    }
}

#[async_trait(?Send)]
impl PeerHandle for MockPeer {
    type Stream = MockStream;

    fn peer_id(&self) -> PeerId {
        self.remote
    }

    fn send(&self, channel: &str, data: &[u8]) -> Result<()> {
        self.ensure_linked()
            .map_err(|e| SdkError::SendFailed(e.to_string()))?;

        self.network.state.borrow_mut().sent.push(SentMessage {
            from: self.local,
            to: self.remote,
            channel: channel.to_string(),
            data: data.to_vec(),
        });
        Ok(())
    }

    async fn create_data_channel(&self, label: &str, mode: DataChannelMode) -> Result<()> {
        self.ensure_linked()
            .map_err(|e| SdkError::DataChannel(e.to_string()))?;

        self.network
            .state
            .borrow_mut()
            .data_channels
            .push((self.remote, label.to_string(), mode));
        Ok(())
    }

    async fn list_streams(&self) -> Result<Vec<StreamAnnouncement>> {
        Ok(self.ensure_linked()?.announcements)
    }

    async fn request_stream(&self, _input: InputLevel) -> Result<MockStream> {
        let host = self.ensure_linked()?;
        if !host.can_stream {
            return Err(SdkError::Stream(
                "RainwayError: Host cannot stream".to_string(),
            ));
        }
        Ok(self.open_stream())
    }

    async fn join_stream(
        &self,
        announcement: &StreamAnnouncement,
        _input: InputLevel,
    ) -> Result<MockStream> {
        let host = self.ensure_linked()?;
        if !host
            .announcements
            .iter()
            .any(|a| a.stream_id == announcement.stream_id)
        {
            return Err(SdkError::Stream(format!(
                "RainwayError: Unknown stream {}",
                announcement.stream_id
            )));
        }
        Ok(self.open_stream())
    }

    async fn ready_to_stream(&self) -> Result<()> {
        let host = self.ensure_linked()?;
        if host.can_stream {
            Ok(())
        } else {
            Err(SdkError::Stream(
                "RainwayError: Host is not ready to stream".to_string(),
            ))
        }
    }

    fn disconnect(&self) {
        let mut state = self.network.state.borrow_mut();
        state.links.remove(&(self.local, self.remote));
        state.disconnects.push(self.remote);
    }
}

/// Observable state of a mock stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockStreamState {
    pub paused: bool,
    pub fullscreen: bool,
    pub stats_overlay: bool,
    pub gestures: bool,
    pub detached: u32,
    pub left: u32,
    pub stopped: bool,
}

/// Stream served by a mock host; clones share state
#[derive(Debug, Clone)]
pub struct MockStream {
    id: StreamId,
    host: PeerId,
    owner: PeerId,
    inner: Rc<RefCell<MockStreamState>>,
}

impl MockStream {
    pub fn host(&self) -> PeerId {
        self.host
    }

    pub fn snapshot(&self) -> MockStreamState {
        self.inner.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        let state = self.inner.borrow();
        state.left == 0 && !state.stopped
    }
}

impl StreamHandle for MockStream {
    fn id(&self) -> StreamId {
        self.id
    }

    fn request_fullscreen(&self) -> Result<()> {
        self.inner.borrow_mut().fullscreen = true;
        Ok(())
    }

    fn pause(&self) {
        self.inner.borrow_mut().paused = true;
    }

    fn play(&self) {
        self.inner.borrow_mut().paused = false;
    }

    fn set_stats_overlay(&self, enabled: bool) {
        self.inner.borrow_mut().stats_overlay = enabled;
    }

    fn set_gestures(&self, enabled: bool) {
        self.inner.borrow_mut().gestures = enabled;
    }

    fn detach(&self) {
        self.inner.borrow_mut().detached += 1;
    }

    fn leave(&self) {
        self.inner.borrow_mut().left += 1;
    }
}
