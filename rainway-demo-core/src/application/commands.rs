use crate::domain::{PeerId, PeerOrigin, StreamAnnouncement, StreamId};

/// Commands that mutate the demo state
///
/// Issued either by the session orchestrator after a user action or by the
/// SDK event handlers. `P` and `S` are the SDK's peer and stream handle types.
#[derive(Debug, Clone, PartialEq)]
pub enum DemoCommand<P, S> {
    /// The runtime is being constructed
    SessionConnecting,

    /// Gateway connection established
    SessionConnected { own_peer_id: PeerId },

    /// Runtime construction or gateway connection failed
    SessionFailed { reason: String },

    /// The runtime went away (user disconnect or connection lost)
    SessionEnded { reason: Option<String> },

    /// Outbound connection attempt started
    PeerConnecting { peer_id: PeerId },

    /// A live peer handle is available
    PeerConnected {
        peer_id: PeerId,
        peer: P,
        origin: PeerOrigin,
        announcements: Vec<StreamAnnouncement>,
    },

    /// Outbound connection attempt failed
    PeerConnectFailed { peer_id: PeerId, reason: String },

    /// Outbound connection attempt cancelled by the user
    PeerConnectCancelled { peer_id: PeerId },

    /// The peer reported it is ready to stream
    PeerReady { peer_id: PeerId },

    /// The peer reported it cannot stream
    PeerCannotStream { peer_id: PeerId },

    /// User disconnects from a peer (entry is kept)
    DisconnectPeer { peer_id: PeerId },

    /// The SDK reported the peer disconnected
    PeerLost { peer_id: PeerId },

    /// User closes a widget (entry is removed)
    RemovePeer { peer_id: PeerId },

    /// Stream request started
    StreamRequested { peer_id: PeerId },

    /// Stream request (or join) resolved with a stream
    StreamStarted {
        peer_id: PeerId,
        stream_id: StreamId,
        stream: S,
    },

    /// Stream request rejected by the SDK
    StreamRequestFailed { peer_id: PeerId, reason: String },

    /// User stops the stream of a widget
    ReleaseStream { peer_id: PeerId },

    /// The SDK reported a stream stopped
    StreamStopped { stream_id: StreamId },

    /// A chat message was handed to the data channel
    ChatSent { peer_id: PeerId, message: String },

    /// Raw bytes arrived on a peer's data channel
    MessageReceived { peer_id: PeerId, data: Vec<u8> },

    /// The peer offers a stream
    StreamAnnounced {
        peer_id: PeerId,
        announcement: StreamAnnouncement,
    },

    /// Non-fatal runtime error of a peer
    PeerError { peer_id: PeerId, reason: String },
}

impl<P, S> DemoCommand<P, S> {
    /// Command name used in failure events and logs
    pub fn name(&self) -> &'static str {
        match self {
            DemoCommand::SessionConnecting => "SessionConnecting",
            DemoCommand::SessionConnected { .. } => "SessionConnected",
            DemoCommand::SessionFailed { .. } => "SessionFailed",
            DemoCommand::SessionEnded { .. } => "SessionEnded",
            DemoCommand::PeerConnecting { .. } => "PeerConnecting",
            DemoCommand::PeerConnected { .. } => "PeerConnected",
            DemoCommand::PeerConnectFailed { .. } => "PeerConnectFailed",
            DemoCommand::PeerConnectCancelled { .. } => "PeerConnectCancelled",
            DemoCommand::PeerReady { .. } => "PeerReady",
            DemoCommand::PeerCannotStream { .. } => "PeerCannotStream",
            DemoCommand::DisconnectPeer { .. } => "DisconnectPeer",
            DemoCommand::PeerLost { .. } => "PeerLost",
            DemoCommand::RemovePeer { .. } => "RemovePeer",
            DemoCommand::StreamRequested { .. } => "StreamRequested",
            DemoCommand::StreamStarted { .. } => "StreamStarted",
            DemoCommand::StreamRequestFailed { .. } => "StreamRequestFailed",
            DemoCommand::ReleaseStream { .. } => "ReleaseStream",
            DemoCommand::StreamStopped { .. } => "StreamStopped",
            DemoCommand::ChatSent { .. } => "ChatSent",
            DemoCommand::MessageReceived { .. } => "MessageReceived",
            DemoCommand::StreamAnnounced { .. } => "StreamAnnounced",
            DemoCommand::PeerError { .. } => "PeerError",
        }
    }
}
