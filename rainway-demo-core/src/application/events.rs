use crate::domain::{
    ActiveStream, ChatEntry, PeerId, PeerOrigin, ReleaseReason, SessionState, StreamAnnouncement,
    WidgetState,
};

/// Events emitted by the reducer
///
/// `PeerReleased` and `StreamReleased` carry handles that left the state; the
/// caller owns them from then on and performs the matching SDK calls.
#[derive(Debug, Clone, PartialEq)]
pub enum DemoEvent<P, S> {
    SessionStateChanged {
        from: SessionState,
        to: SessionState,
    },

    /// Session failure display string
    SessionFailed { reason: String },

    /// All entries were dropped by a session rollback
    RosterCleared { removed: usize },

    PeerAdded { peer_id: PeerId, origin: PeerOrigin },

    PeerRemoved { peer_id: PeerId },

    WidgetStateChanged {
        peer_id: PeerId,
        from: WidgetState,
        to: WidgetState,
    },

    /// A peer handle left the roster
    PeerReleased {
        peer_id: PeerId,
        peer: P,
        reason: ReleaseReason,
    },

    /// A stream handle left its widget
    StreamReleased {
        peer_id: PeerId,
        stream: ActiveStream<S>,
        reason: ReleaseReason,
    },

    ChatAppended { peer_id: PeerId, entry: ChatEntry },

    AnnouncementAdded {
        peer_id: PeerId,
        announcement: StreamAnnouncement,
    },

    PeerErrorLogged { peer_id: PeerId, reason: String },

    /// Outbound attempt failed; shown inline next to the connect form
    ConnectFailed { peer_id: PeerId, reason: String },

    ConnectCancelled { peer_id: PeerId },

    StreamFailed { peer_id: PeerId, reason: String },

    /// Stale or unroutable command (e.g. a message for an unknown peer)
    CommandIgnored { command: String, reason: String },

    /// Command failed
    CommandFailed { command: String, reason: String },
}

impl<P, S> DemoEvent<P, S> {
    pub fn is_failure(&self) -> bool {
        matches!(self, DemoEvent::CommandFailed { .. })
    }
}
