use crate::domain::{
    ActiveStream, ChatEntry, PeerId, PeerOrigin, StreamAnnouncement, StreamId, WidgetState,
};
use std::collections::{BTreeMap, BTreeSet};

/// Errors that can occur when mutating the roster
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("No active session")]
    NoSession,

    #[error("Peer not found: {0}")]
    PeerNotFound(PeerId),

    #[error("Peer {0} is not connected")]
    NotConnected(PeerId),

    #[error("Already connected to peer {0}")]
    AlreadyConnected(PeerId),

    #[error("A connection attempt to {0} is already in progress")]
    AttemptInFlight(PeerId),

    #[error("A stream request to {0} is already in progress")]
    StreamRequestInFlight(PeerId),

    #[error("Peer {0} is not ready to stream")]
    NotReadyToStream(PeerId),

    #[error("Peer {0} is already streaming")]
    AlreadyStreaming(PeerId),
}

/// A known remote peer plus the UI state of its widget
///
/// `P` is the SDK's peer handle type and `S` its stream handle type. Both are
/// opaque to the domain; the entry only decides when they are held and when
/// they have to be given back.
#[derive(Debug, Clone)]
pub struct RosterEntry<P, S> {
    peer_id: PeerId,
    origin: PeerOrigin,
    peer: Option<P>,
    state: WidgetState,
    stream: Option<ActiveStream<S>>,
    stream_requested: bool,
    chat_history: Vec<ChatEntry>,
    stream_stop_count: u32,
    announcements: Vec<StreamAnnouncement>,
}

impl<P, S> RosterEntry<P, S> {
    pub fn new(peer_id: PeerId, origin: PeerOrigin) -> Self {
        Self {
            peer_id,
            origin,
            peer: None,
            state: WidgetState::Disconnected,
            stream: None,
            stream_requested: false,
            chat_history: Vec::new(),
            stream_stop_count: 0,
            announcements: Vec::new(),
        }
    }

    // Getters

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    pub fn origin(&self) -> PeerOrigin {
        self.origin
    }

    pub fn peer(&self) -> Option<&P> {
        self.peer.as_ref()
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn stream(&self) -> Option<&ActiveStream<S>> {
        self.stream.as_ref()
    }

    pub fn chat_history(&self) -> &[ChatEntry] {
        &self.chat_history
    }

    pub fn stream_stop_count(&self) -> u32 {
        self.stream_stop_count
    }

    pub fn announcements(&self) -> &[StreamAnnouncement] {
        &self.announcements
    }

    pub fn is_online(&self) -> bool {
        self.peer.is_some()
    }

    pub fn is_requesting_stream(&self) -> bool {
        self.stream_requested
    }

    /// Handle presence matches the widget state, and a stream only exists while streaming
    pub fn invariants_hold(&self) -> bool {
        self.peer.is_some() == self.state.has_peer()
            && self.stream.is_some() == self.state.is_streaming()
    }

    // State mutations

    /// Disconnected → ConnectingToHost. Other states are left alone.
    pub(crate) fn begin_connecting(&mut self) -> WidgetState {
        let previous = self.state;
        if self.state == WidgetState::Disconnected {
            self.state = WidgetState::ConnectingToHost;
        }
        previous
    }

    /// ConnectingToHost → Disconnected after a failed or cancelled attempt
    pub(crate) fn abort_connecting(&mut self) -> WidgetState {
        let previous = self.state;
        if self.state == WidgetState::ConnectingToHost {
            self.state = WidgetState::Disconnected;
        }
        previous
    }

    /// Store a live handle. Replaces any previous handle for the same peer.
    pub(crate) fn attach_peer(&mut self, peer: P) -> (WidgetState, Option<P>) {
        let previous = self.state;
        let replaced = self.peer.replace(peer);
        if self.state < WidgetState::ConnectedNoStream {
            self.state = WidgetState::ConnectedNoStream;
        }
        (previous, replaced)
    }

    pub(crate) fn mark_ready(&mut self) -> Result<WidgetState, RosterError> {
        if self.peer.is_none() {
            return Err(RosterError::NotConnected(self.peer_id));
        }

        let previous = self.state;
        if matches!(
            self.state,
            WidgetState::ConnectedNoStream | WidgetState::ConnectedCantStream
        ) {
            self.state = WidgetState::ConnectedReadyToStream;
        }
        Ok(previous)
    }

    pub(crate) fn mark_cannot_stream(&mut self) -> Result<WidgetState, RosterError> {
        if self.peer.is_none() {
            return Err(RosterError::NotConnected(self.peer_id));
        }

        let previous = self.state;
        if self.state == WidgetState::ConnectedNoStream {
            self.state = WidgetState::ConnectedCantStream;
        }
        Ok(previous)
    }

    /// Raise the in-flight flag for a stream request
    pub(crate) fn begin_stream_request(&mut self) -> Result<(), RosterError> {
        if self.peer.is_none() {
            return Err(RosterError::NotConnected(self.peer_id));
        }
        if self.stream_requested {
            return Err(RosterError::StreamRequestInFlight(self.peer_id));
        }
        if self.stream.is_some() {
            return Err(RosterError::AlreadyStreaming(self.peer_id));
        }
        if self.state != WidgetState::ConnectedReadyToStream {
            return Err(RosterError::NotReadyToStream(self.peer_id));
        }

        self.stream_requested = true;
        Ok(())
    }

    pub(crate) fn finish_stream_request(&mut self) {
        self.stream_requested = false;
    }

    /// Attach a freshly obtained stream.
    ///
    /// The stream is handed back when it cannot be attached (peer gone in the
    /// meantime, or another stream already running) so the caller can leave it.
    pub(crate) fn attach_stream(
        &mut self,
        stream: ActiveStream<S>,
    ) -> Result<WidgetState, ActiveStream<S>> {
        self.stream_requested = false;

        if self.peer.is_none() || self.stream.is_some() {
            return Err(stream);
        }

        let previous = self.state;
        self.stream = Some(stream);
        self.state = WidgetState::Streaming;
        Ok(previous)
    }

    /// Take the stream out of the widget. Calling this twice is a no-op.
    pub(crate) fn release_stream(&mut self, stopped_by_sdk: bool) -> Option<ActiveStream<S>> {
        let stream = self.stream.take()?;

        if stopped_by_sdk {
            self.stream_stop_count += 1;
        }

        if self.state == WidgetState::Streaming {
            self.state = if self.peer.is_some() {
                WidgetState::ConnectedReadyToStream
            } else {
                WidgetState::Disconnected
            };
        }

        Some(stream)
    }

    /// Drop the live handle (and any stream) and fall back to Disconnected
    pub(crate) fn detach_peer(&mut self) -> (Option<P>, Option<ActiveStream<S>>) {
        let stream = self.stream.take();
        let peer = self.peer.take();
        self.stream_requested = false;
        self.state = WidgetState::Disconnected;
        (peer, stream)
    }

    pub(crate) fn push_chat(&mut self, entry: ChatEntry) {
        self.chat_history.push(entry);
    }

    /// Record an announcement; repeated announcements of the same stream are ignored
    pub(crate) fn add_announcement(&mut self, announcement: StreamAnnouncement) -> bool {
        if self
            .announcements
            .iter()
            .any(|a| a.stream_id == announcement.stream_id)
        {
            return false;
        }
        self.announcements.push(announcement);
        true
    }
}

/// Ordered collection of known peers
#[derive(Debug, Clone)]
pub struct Roster<P, S> {
    entries: Vec<RosterEntry<P, S>>,
    /// Outbound attempts currently awaiting the SDK
    pending: BTreeSet<PeerId>,
    /// Error of the last failed outbound attempt per peer (shown next to its connect form)
    connect_errors: BTreeMap<PeerId, String>,
}

impl<P, S> Default for Roster<P, S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            pending: BTreeSet::new(),
            connect_errors: BTreeMap::new(),
        }
    }
}

impl<P, S> Roster<P, S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[RosterEntry<P, S>] {
        &self.entries
    }

    pub fn get(&self, peer_id: PeerId) -> Option<&RosterEntry<P, S>> {
        self.entries.iter().find(|e| e.peer_id == peer_id)
    }

    pub(crate) fn get_mut(&mut self, peer_id: PeerId) -> Option<&mut RosterEntry<P, S>> {
        self.entries.iter_mut().find(|e| e.peer_id == peer_id)
    }

    pub fn contains(&self, peer_id: PeerId) -> bool {
        self.get(peer_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn online_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_online()).count()
    }

    pub fn is_pending(&self, peer_id: PeerId) -> bool {
        self.pending.contains(&peer_id)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Peers with an outbound attempt in flight, in id order
    pub fn pending_peers(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.pending.iter().copied()
    }

    pub fn connect_error(&self, peer_id: PeerId) -> Option<&str> {
        self.connect_errors.get(&peer_id).map(String::as_str)
    }

    /// Failed outbound attempts with their reasons, in id order
    pub fn connect_errors(&self) -> impl Iterator<Item = (PeerId, &str)> + '_ {
        self.connect_errors
            .iter()
            .map(|(peer_id, reason)| (*peer_id, reason.as_str()))
    }

    /// Find the widget currently showing a stream
    pub fn find_by_stream(&self, stream_id: StreamId) -> Option<PeerId> {
        self.entries
            .iter()
            .find(|e| e.stream.as_ref().map(|s| s.id) == Some(stream_id))
            .map(|e| e.peer_id)
    }

    pub fn invariants_hold(&self) -> bool {
        let unique = self
            .entries
            .iter()
            .map(|e| e.peer_id)
            .collect::<BTreeSet<_>>()
            .len()
            == self.entries.len();

        unique && self.entries.iter().all(|e| e.invariants_hold())
    }

    pub(crate) fn begin_attempt(&mut self, peer_id: PeerId) -> Result<(), RosterError> {
        if !self.pending.insert(peer_id) {
            return Err(RosterError::AttemptInFlight(peer_id));
        }
        self.connect_errors.remove(&peer_id);
        Ok(())
    }

    pub(crate) fn end_attempt(&mut self, peer_id: PeerId) -> bool {
        self.pending.remove(&peer_id)
    }

    pub(crate) fn set_connect_error(&mut self, peer_id: PeerId, error: Option<String>) {
        match error {
            Some(reason) => self.connect_errors.insert(peer_id, reason),
            None => self.connect_errors.remove(&peer_id),
        };
    }

    /// Get the entry for `peer_id`, creating it at the end of the roster if absent
    pub(crate) fn upsert(
        &mut self,
        peer_id: PeerId,
        origin: PeerOrigin,
    ) -> (&mut RosterEntry<P, S>, bool) {
        match self.entries.iter().position(|e| e.peer_id == peer_id) {
            Some(index) => (&mut self.entries[index], false),
            None => {
                self.entries.push(RosterEntry::new(peer_id, origin));
                let last = self.entries.len() - 1;
                (&mut self.entries[last], true)
            }
        }
    }

    pub(crate) fn remove(&mut self, peer_id: PeerId) -> Option<RosterEntry<P, S>> {
        let index = self.entries.iter().position(|e| e.peer_id == peer_id)?;
        Some(self.entries.remove(index))
    }

    /// Remove every entry and forget pending attempts
    pub(crate) fn clear(&mut self) -> Vec<RosterEntry<P, S>> {
        self.pending.clear();
        self.connect_errors.clear();
        std::mem::take(&mut self.entries)
    }
}
