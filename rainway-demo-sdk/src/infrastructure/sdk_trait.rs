use crate::application::EventHandlers;
use crate::error::Result;
use async_trait::async_trait;
use rainway_demo_core::{
    DataChannelMode, InputLevel, LogLevel, PeerId, StreamAnnouncement, StreamId,
};
use std::fmt;

/// Peer handle type produced by a connector
pub type PeerOf<C> = <<C as Connector>::Runtime as Runtime>::Peer;

/// Stream handle type produced by a connector
pub type StreamOf<C> = <PeerOf<C> as PeerHandle>::Stream;

/// Options passed to the SDK when a runtime is constructed
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeOptions {
    pub api_key: String,
    pub external_id: String,
    pub minimum_log_level: LogLevel,
}

/// Entry point of the SDK (allows mocking in tests)
#[async_trait(?Send)]
pub trait Connector {
    type Runtime: Runtime;

    /// Construct a runtime; the handlers are registered once and stay for its lifetime
    async fn initialize(
        &self,
        options: RuntimeOptions,
        handlers: EventHandlers<PeerOf<Self>, StreamOf<Self>>,
    ) -> Result<Self::Runtime>;
}

/// Connection of this client to the gateway
#[async_trait(?Send)]
pub trait Runtime: 'static {
    type Peer: PeerHandle;

    async fn connect_to_gateway(&self) -> Result<()>;

    fn disconnect_from_gateway(&self);

    /// Single connection attempt to a remote peer
    async fn connect(&self, peer_id: PeerId) -> Result<Self::Peer>;

    /// Our own id as assigned by the gateway
    fn peer_id(&self) -> PeerId;

    /// Best effort; the pending `connect` may still resolve
    fn cancel_connection_attempt(&self, peer_id: PeerId);
}

/// Live connection to a remote peer
#[async_trait(?Send)]
pub trait PeerHandle: Clone + fmt::Debug + 'static {
    type Stream: StreamHandle;

    fn peer_id(&self) -> PeerId;

    /// Fire-and-forget send on a named data channel
    fn send(&self, channel: &str, data: &[u8]) -> Result<()>;

    async fn create_data_channel(&self, label: &str, mode: DataChannelMode) -> Result<()>;

    async fn list_streams(&self) -> Result<Vec<StreamAnnouncement>>;

    async fn request_stream(&self, input: InputLevel) -> Result<Self::Stream>;

    async fn join_stream(
        &self,
        announcement: &StreamAnnouncement,
        input: InputLevel,
    ) -> Result<Self::Stream>;

    /// Resolves once the peer can host a stream
    async fn ready_to_stream(&self) -> Result<()>;

    fn disconnect(&self);
}

/// Media stream received from a peer
pub trait StreamHandle: Clone + fmt::Debug + 'static {
    /// Stable local identity, used to route stream-stop notifications
    fn id(&self) -> StreamId;

    fn request_fullscreen(&self) -> Result<()>;

    fn pause(&self);

    fn play(&self);

    fn set_stats_overlay(&self, enabled: bool);

    fn set_gestures(&self, enabled: bool);

    /// Remove the rendered surface from the page
    fn detach(&self);

    /// Tell the SDK we no longer watch this stream
    fn leave(&self);
}
