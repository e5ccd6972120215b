use crate::application::{DemoCommand, DemoEvent};
use crate::domain::{
    ActiveStream, ChatEntry, DemoState, PeerId, PeerOrigin, ReleaseReason, RosterEntry,
    RosterError, SessionState, StreamAnnouncement, StreamId, WidgetState,
};

/// Reducer that applies commands to the demo state and emits events
///
/// Every SDK callback and every user action ends up here, so handlers always
/// see the current roster rather than a snapshot taken when a callback was
/// registered.
#[derive(Debug, Clone)]
pub struct DemoEventLoop<P, S> {
    state: DemoState<P, S>,
}

impl<P, S> Default for DemoEventLoop<P, S> {
    fn default() -> Self {
        Self {
            state: DemoState::new(),
        }
    }
}

impl<P, S> DemoEventLoop<P, S> {
    /// Create a new event loop with a disconnected session and an empty roster
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DemoState<P, S> {
        &self.state
    }

    /// Process a single command and return the resulting events
    pub fn handle_command(&mut self, command: DemoCommand<P, S>) -> Vec<DemoEvent<P, S>> {
        let name = command.name();
        tracing::trace!("Handling {}", name);

        match command {
            DemoCommand::SessionConnecting => self.handle_session_connecting(),

            DemoCommand::SessionConnected { own_peer_id } => {
                self.handle_session_connected(own_peer_id)
            }

            DemoCommand::SessionFailed { reason } => self.teardown(Some(reason), true),

            DemoCommand::SessionEnded { reason } => self.teardown(reason, false),

            DemoCommand::PeerConnecting { peer_id } => self.handle_peer_connecting(peer_id),

            DemoCommand::PeerConnected {
                peer_id,
                peer,
                origin,
                announcements,
            } => self.handle_peer_connected(peer_id, peer, origin, announcements),

            DemoCommand::PeerConnectFailed { peer_id, reason } => {
                self.handle_connect_failed(peer_id, reason)
            }

            DemoCommand::PeerConnectCancelled { peer_id } => self.handle_connect_cancelled(peer_id),

            DemoCommand::PeerReady { peer_id } => self.handle_readiness(name, peer_id, true),

            DemoCommand::PeerCannotStream { peer_id } => {
                self.handle_readiness(name, peer_id, false)
            }

            DemoCommand::DisconnectPeer { peer_id } => self.handle_disconnect_peer(peer_id),

            DemoCommand::PeerLost { peer_id } => self.handle_peer_lost(peer_id),

            DemoCommand::RemovePeer { peer_id } => self.handle_remove_peer(peer_id),

            DemoCommand::StreamRequested { peer_id } => self.handle_stream_requested(peer_id),

            DemoCommand::StreamStarted {
                peer_id,
                stream_id,
                stream,
            } => self.handle_stream_started(peer_id, stream_id, stream),

            DemoCommand::StreamRequestFailed { peer_id, reason } => {
                self.handle_stream_request_failed(peer_id, reason)
            }

            DemoCommand::ReleaseStream { peer_id } => self.handle_release_stream(peer_id),

            DemoCommand::StreamStopped { stream_id } => self.handle_stream_stopped(stream_id),

            DemoCommand::ChatSent { peer_id, message } => self.handle_chat_sent(peer_id, message),

            DemoCommand::MessageReceived { peer_id, data } => {
                self.handle_message_received(peer_id, data)
            }

            DemoCommand::StreamAnnounced {
                peer_id,
                announcement,
            } => self.handle_stream_announced(peer_id, announcement),

            DemoCommand::PeerError { peer_id, reason } => {
                tracing::warn!("Peer {} reported an error: {}", peer_id, reason);
                vec![DemoEvent::PeerErrorLogged { peer_id, reason }]
            }
        }
    }

    fn handle_session_connecting(&mut self) -> Vec<DemoEvent<P, S>> {
        match self.state.session {
            SessionState::Disconnected => {
                self.state.session_error = None;
                vec![self.set_session(SessionState::Connecting)]
            }
            SessionState::Connecting => failed(
                "SessionConnecting",
                "A session connection is already in progress",
            ),
            SessionState::Connected => ignored("SessionConnecting", "Session already connected"),
        }
    }

    fn handle_session_connected(&mut self, own_peer_id: PeerId) -> Vec<DemoEvent<P, S>> {
        tracing::info!("Session connected as {}", own_peer_id);
        self.state.own_peer_id = Some(own_peer_id);
        self.state.session_error = None;

        if self.state.session == SessionState::Connected {
            return Vec::new();
        }
        vec![self.set_session(SessionState::Connected)]
    }

    /// Roll everything back: release all streams and peers, clear the roster
    fn teardown(&mut self, reason: Option<String>, is_failure: bool) -> Vec<DemoEvent<P, S>> {
        let mut events = Vec::new();

        let entries = self.state.roster.clear();
        let removed = entries.len();
        for mut entry in entries {
            let peer_id = entry.peer_id();
            let (peer, stream) = entry.detach_peer();
            if let Some(stream) = stream {
                events.push(DemoEvent::StreamReleased {
                    peer_id,
                    stream,
                    reason: ReleaseReason::SessionEnded,
                });
            }
            if let Some(peer) = peer {
                events.push(DemoEvent::PeerReleased {
                    peer_id,
                    peer,
                    reason: ReleaseReason::SessionEnded,
                });
            }
            events.push(DemoEvent::PeerRemoved { peer_id });
        }

        if removed > 0 {
            tracing::info!("Session rollback removed {} peer(s)", removed);
            events.push(DemoEvent::RosterCleared { removed });
        }

        self.state.own_peer_id = None;
        self.state.session_error = reason.clone();

        if is_failure {
            let reason = reason.unwrap_or_default();
            tracing::error!("Session failed: {}", reason);
            events.push(DemoEvent::SessionFailed { reason });
        }

        if self.state.session != SessionState::Disconnected {
            events.push(self.set_session(SessionState::Disconnected));
        }

        events
    }

    fn handle_peer_connecting(&mut self, peer_id: PeerId) -> Vec<DemoEvent<P, S>> {
        const COMMAND: &str = "PeerConnecting";

        if !self.state.session.is_connected() {
            return failed(COMMAND, RosterError::NoSession);
        }

        let roster = &mut self.state.roster;
        if roster.get(peer_id).is_some_and(|e| e.is_online()) {
            return failed(COMMAND, RosterError::AlreadyConnected(peer_id));
        }
        if let Err(e) = roster.begin_attempt(peer_id) {
            return failed(COMMAND, e);
        }

        tracing::info!("Connecting to peer {}", peer_id);

        match roster.get_mut(peer_id) {
            Some(entry) => {
                let from = entry.begin_connecting();
                state_change(entry, from).into_iter().collect()
            }
            None => Vec::new(),
        }
    }

    fn handle_peer_connected(
        &mut self,
        peer_id: PeerId,
        peer: P,
        origin: PeerOrigin,
        announcements: Vec<StreamAnnouncement>,
    ) -> Vec<DemoEvent<P, S>> {
        let roster = &mut self.state.roster;
        // Only the outbound attempt itself settles it; a peer dialing us meanwhile does not
        let was_pending = matches!(origin, PeerOrigin::Outbound) && roster.end_attempt(peer_id);

        if !self.state.session.is_connected() {
            // Attempt resolved after the session went away
            return vec![
                DemoEvent::PeerReleased {
                    peer_id,
                    peer,
                    reason: ReleaseReason::Local,
                },
                DemoEvent::CommandIgnored {
                    command: "PeerConnected".to_string(),
                    reason: RosterError::NoSession.to_string(),
                },
            ];
        }

        if was_pending {
            roster.set_connect_error(peer_id, None);
        }

        let mut events = Vec::new();
        let (entry, created) = roster.upsert(peer_id, origin);

        if entry.is_online() {
            // The live connection keeps its handle; the duplicate is dropped, not disconnected
            tracing::debug!("Peer {} already connected ({}), keeping its handle", peer_id, origin);
            drop(peer);
            merge_announcements(entry, announcements, &mut events);
            return events;
        }

        let reconnected = !created;
        let (from, _) = entry.attach_peer(peer);

        if created {
            tracing::info!("Peer {} connected ({})", peer_id, origin);
            events.push(DemoEvent::PeerAdded { peer_id, origin });
        }

        if reconnected {
            tracing::info!("Peer {} reconnected", peer_id);
            let info = ChatEntry::info(format!("Reconnected to peer {}", peer_id));
            entry.push_chat(info.clone());
            events.push(DemoEvent::ChatAppended {
                peer_id,
                entry: info,
            });
        }

        events.extend(state_change(entry, from));
        merge_announcements(entry, announcements, &mut events);
        events
    }

    fn handle_connect_failed(&mut self, peer_id: PeerId, reason: String) -> Vec<DemoEvent<P, S>> {
        let roster = &mut self.state.roster;
        roster.end_attempt(peer_id);
        roster.set_connect_error(peer_id, Some(reason.clone()));

        tracing::warn!("Connection to peer {} failed: {}", peer_id, reason);

        let mut events = Vec::new();
        if let Some(entry) = roster.get_mut(peer_id) {
            let from = entry.abort_connecting();
            events.extend(state_change(entry, from));
        }
        events.push(DemoEvent::ConnectFailed { peer_id, reason });
        events
    }

    fn handle_connect_cancelled(&mut self, peer_id: PeerId) -> Vec<DemoEvent<P, S>> {
        let roster = &mut self.state.roster;
        if !roster.end_attempt(peer_id) {
            return ignored(
                "PeerConnectCancelled",
                format!("No connection attempt to {} in progress", peer_id),
            );
        }

        tracing::info!("Connection attempt to {} cancelled", peer_id);

        let mut events = Vec::new();
        if let Some(entry) = roster.get_mut(peer_id) {
            let from = entry.abort_connecting();
            events.extend(state_change(entry, from));
        }
        events.push(DemoEvent::ConnectCancelled { peer_id });
        events
    }

    fn handle_readiness(
        &mut self,
        command: &str,
        peer_id: PeerId,
        ready: bool,
    ) -> Vec<DemoEvent<P, S>> {
        let entry = match self.state.roster.get_mut(peer_id) {
            Some(e) => e,
            None => return ignored(command, RosterError::PeerNotFound(peer_id)),
        };

        let result = if ready {
            entry.mark_ready()
        } else {
            entry.mark_cannot_stream()
        };

        match result {
            Ok(from) => state_change(entry, from).into_iter().collect(),
            // Readiness resolved after the peer went away
            Err(e) => ignored(command, e),
        }
    }

    fn handle_disconnect_peer(&mut self, peer_id: PeerId) -> Vec<DemoEvent<P, S>> {
        const COMMAND: &str = "DisconnectPeer";

        let entry = match self.state.roster.get_mut(peer_id) {
            Some(e) => e,
            None => return failed(COMMAND, RosterError::PeerNotFound(peer_id)),
        };

        if !entry.is_online() {
            return ignored(COMMAND, RosterError::NotConnected(peer_id));
        }

        tracing::info!("Disconnecting from peer {}", peer_id);

        let mut events = Vec::new();
        detach(entry, ReleaseReason::Local, &mut events);
        push_info(
            entry,
            format!("Disconnected from peer {}", peer_id),
            &mut events,
        );
        events
    }

    fn handle_peer_lost(&mut self, peer_id: PeerId) -> Vec<DemoEvent<P, S>> {
        const COMMAND: &str = "PeerLost";

        let entry = match self.state.roster.get_mut(peer_id) {
            Some(e) => e,
            None => return ignored(COMMAND, RosterError::PeerNotFound(peer_id)),
        };

        if !entry.is_online() {
            return ignored(COMMAND, RosterError::NotConnected(peer_id));
        }

        tracing::info!("Peer {} disconnected", peer_id);

        let mut events = Vec::new();
        detach(entry, ReleaseReason::PeerGone, &mut events);
        push_info(entry, format!("Peer {} disconnected", peer_id), &mut events);
        events
    }

    fn handle_remove_peer(&mut self, peer_id: PeerId) -> Vec<DemoEvent<P, S>> {
        let roster = &mut self.state.roster;
        roster.end_attempt(peer_id);

        let mut entry = match roster.remove(peer_id) {
            Some(e) => e,
            None => return failed("RemovePeer", RosterError::PeerNotFound(peer_id)),
        };

        tracing::info!("Removing peer {} from the roster", peer_id);

        let mut events = Vec::new();
        detach(&mut entry, ReleaseReason::Local, &mut events);
        events.push(DemoEvent::PeerRemoved { peer_id });
        events
    }

    fn handle_stream_requested(&mut self, peer_id: PeerId) -> Vec<DemoEvent<P, S>> {
        const COMMAND: &str = "StreamRequested";

        let entry = match self.state.roster.get_mut(peer_id) {
            Some(e) => e,
            None => return failed(COMMAND, RosterError::PeerNotFound(peer_id)),
        };

        match entry.begin_stream_request() {
            Ok(()) => {
                tracing::debug!("Stream requested from {}", peer_id);
                Vec::new()
            }
            Err(e) => failed(COMMAND, e),
        }
    }

    fn handle_stream_started(
        &mut self,
        peer_id: PeerId,
        stream_id: StreamId,
        stream: S,
    ) -> Vec<DemoEvent<P, S>> {
        let stream = ActiveStream::new(stream_id, stream);

        let entry = match self.state.roster.get_mut(peer_id) {
            Some(e) => e,
            None => {
                return vec![
                    DemoEvent::StreamReleased {
                        peer_id,
                        stream,
                        reason: ReleaseReason::PeerGone,
                    },
                    DemoEvent::CommandIgnored {
                        command: "StreamStarted".to_string(),
                        reason: RosterError::PeerNotFound(peer_id).to_string(),
                    },
                ];
            }
        };

        match entry.attach_stream(stream) {
            Ok(from) => {
                tracing::info!("Streaming from peer {} ({})", peer_id, stream_id);
                state_change(entry, from).into_iter().collect()
            }
            Err(stream) => {
                tracing::warn!("Peer {} cannot take stream {}", peer_id, stream_id);
                vec![DemoEvent::StreamReleased {
                    peer_id,
                    stream,
                    reason: ReleaseReason::Local,
                }]
            }
        }
    }

    fn handle_stream_request_failed(
        &mut self,
        peer_id: PeerId,
        reason: String,
    ) -> Vec<DemoEvent<P, S>> {
        if let Some(entry) = self.state.roster.get_mut(peer_id) {
            entry.finish_stream_request();
        }

        tracing::warn!("Stream request to {} failed: {}", peer_id, reason);
        vec![DemoEvent::StreamFailed { peer_id, reason }]
    }

    fn handle_release_stream(&mut self, peer_id: PeerId) -> Vec<DemoEvent<P, S>> {
        const COMMAND: &str = "ReleaseStream";

        let entry = match self.state.roster.get_mut(peer_id) {
            Some(e) => e,
            None => return ignored(COMMAND, RosterError::PeerNotFound(peer_id)),
        };

        let from = entry.state();
        match entry.release_stream(false) {
            Some(stream) => {
                tracing::info!("Leaving stream {} of peer {}", stream.id, peer_id);
                let mut events = vec![DemoEvent::StreamReleased {
                    peer_id,
                    stream,
                    reason: ReleaseReason::Local,
                }];
                events.extend(state_change(entry, from));
                events
            }
            None => ignored(COMMAND, format!("Peer {} has no active stream", peer_id)),
        }
    }

    fn handle_stream_stopped(&mut self, stream_id: StreamId) -> Vec<DemoEvent<P, S>> {
        const COMMAND: &str = "StreamStopped";

        let roster = &mut self.state.roster;
        let peer_id = match roster.find_by_stream(stream_id) {
            Some(id) => id,
            None => return ignored(COMMAND, format!("Unknown stream {}", stream_id)),
        };
        let entry = match roster.get_mut(peer_id) {
            Some(e) => e,
            None => return ignored(COMMAND, RosterError::PeerNotFound(peer_id)),
        };

        let from = entry.state();
        match entry.release_stream(true) {
            Some(stream) => {
                tracing::info!("Stream {} of peer {} stopped", stream_id, peer_id);
                let mut events = vec![DemoEvent::StreamReleased {
                    peer_id,
                    stream,
                    reason: ReleaseReason::Stopped,
                }];
                events.extend(state_change(entry, from));
                events
            }
            None => ignored(COMMAND, format!("Unknown stream {}", stream_id)),
        }
    }

    fn handle_chat_sent(&mut self, peer_id: PeerId, message: String) -> Vec<DemoEvent<P, S>> {
        let entry = match self.state.roster.get_mut(peer_id) {
            Some(e) => e,
            None => return failed("ChatSent", RosterError::PeerNotFound(peer_id)),
        };

        let chat = ChatEntry::outgoing(message);
        entry.push_chat(chat.clone());
        vec![DemoEvent::ChatAppended {
            peer_id,
            entry: chat,
        }]
    }

    fn handle_message_received(&mut self, peer_id: PeerId, data: Vec<u8>) -> Vec<DemoEvent<P, S>> {
        let entry = match self.state.roster.get_mut(peer_id) {
            Some(e) => e,
            None => {
                tracing::debug!("Dropping message from unknown peer {}", peer_id);
                return ignored("MessageReceived", RosterError::PeerNotFound(peer_id));
            }
        };

        let chat = ChatEntry::decode_incoming(&data);
        entry.push_chat(chat.clone());
        vec![DemoEvent::ChatAppended {
            peer_id,
            entry: chat,
        }]
    }

    fn handle_stream_announced(
        &mut self,
        peer_id: PeerId,
        announcement: StreamAnnouncement,
    ) -> Vec<DemoEvent<P, S>> {
        let entry = match self.state.roster.get_mut(peer_id) {
            Some(e) => e,
            None => return ignored("StreamAnnounced", RosterError::PeerNotFound(peer_id)),
        };

        if !entry.add_announcement(announcement.clone()) {
            return Vec::new();
        }

        tracing::info!("Peer {} announced {}", peer_id, announcement.label());
        vec![DemoEvent::AnnouncementAdded {
            peer_id,
            announcement,
        }]
    }

    fn set_session(&mut self, to: SessionState) -> DemoEvent<P, S> {
        let from = self.state.session;
        self.state.session = to;
        tracing::debug!("Session {:?} -> {:?}", from, to);
        DemoEvent::SessionStateChanged { from, to }
    }
}

impl<P: Clone, S: Clone> DemoEventLoop<P, S> {
    /// Owned copy of the current state for rendering
    pub fn snapshot(&self) -> DemoState<P, S> {
        self.state.clone()
    }
}

fn failed<P, S>(command: &str, reason: impl std::fmt::Display) -> Vec<DemoEvent<P, S>> {
    vec![DemoEvent::CommandFailed {
        command: command.to_string(),
        reason: reason.to_string(),
    }]
}

fn ignored<P, S>(command: &str, reason: impl std::fmt::Display) -> Vec<DemoEvent<P, S>> {
    vec![DemoEvent::CommandIgnored {
        command: command.to_string(),
        reason: reason.to_string(),
    }]
}

fn state_change<P, S>(
    entry: &RosterEntry<P, S>,
    from: WidgetState,
) -> Option<DemoEvent<P, S>> {
    let to = entry.state();
    if from == to {
        return None;
    }

    tracing::debug!("Widget {}: {:?} -> {:?}", entry.peer_id(), from, to);
    Some(DemoEvent::WidgetStateChanged {
        peer_id: entry.peer_id(),
        from,
        to,
    })
}

/// Take the live handle and any stream out of an entry
fn detach<P, S>(
    entry: &mut RosterEntry<P, S>,
    reason: ReleaseReason,
    events: &mut Vec<DemoEvent<P, S>>,
) {
    let peer_id = entry.peer_id();
    let from = entry.state();
    let (peer, stream) = entry.detach_peer();

    if let Some(stream) = stream {
        events.push(DemoEvent::StreamReleased {
            peer_id,
            stream,
            reason,
        });
    }
    if let Some(peer) = peer {
        events.push(DemoEvent::PeerReleased {
            peer_id,
            peer,
            reason,
        });
    }
    events.extend(state_change(entry, from));
}

fn merge_announcements<P, S>(
    entry: &mut RosterEntry<P, S>,
    announcements: Vec<StreamAnnouncement>,
    events: &mut Vec<DemoEvent<P, S>>,
) {
    for announcement in announcements {
        if entry.add_announcement(announcement.clone()) {
            events.push(DemoEvent::AnnouncementAdded {
                peer_id: entry.peer_id(),
                announcement,
            });
        }
    }
}

fn push_info<P, S>(entry: &mut RosterEntry<P, S>, message: String, events: &mut Vec<DemoEvent<P, S>>) {
    let info = ChatEntry::info(message);
    entry.push_chat(info.clone());
    events.push(DemoEvent::ChatAppended {
        peer_id: entry.peer_id(),
        entry: info,
    });
}
