use rainway_demo_core::{LogLevel, PeerId, StreamAnnouncement};
use std::fmt;
use std::rc::Rc;

/// Inbound connection request; answer it exactly once
pub struct ConnectionRequest {
    peer_id: PeerId,
    responder: Box<dyn FnOnce(bool)>,
}

impl ConnectionRequest {
    pub fn new(peer_id: PeerId, responder: impl FnOnce(bool) + 'static) -> Self {
        Self {
            peer_id,
            responder: Box::new(responder),
        }
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    pub fn accept(self) {
        (self.responder)(true)
    }

    pub fn reject(self) {
        (self.responder)(false)
    }
}

impl fmt::Debug for ConnectionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRequest")
            .field("peer_id", &self.peer_id)
            .finish()
    }
}

/// The fixed table of named callbacks handed to the SDK at runtime construction
///
/// Each callback is reference counted so a binding can hand clones to several
/// foreign closures.
pub struct EventHandlers<P, S> {
    /// The gateway connection died; the argument is the SDK's error text
    pub on_connection_lost: Rc<dyn Fn(String)>,
    pub on_connection_request: Rc<dyn Fn(ConnectionRequest)>,
    /// Peer, channel label, payload
    pub on_peer_message: Rc<dyn Fn(PeerId, String, Vec<u8>)>,
    pub on_peer_error: Rc<dyn Fn(PeerId, String)>,
    pub on_peer_connect: Rc<dyn Fn(P)>,
    pub on_peer_disconnect: Rc<dyn Fn(PeerId)>,
    pub on_stream_announcement: Rc<dyn Fn(PeerId, StreamAnnouncement)>,
    pub on_stream_stop: Rc<dyn Fn(S)>,
    pub log_sink: Rc<dyn Fn(LogLevel, String)>,
}

impl<P, S> Clone for EventHandlers<P, S> {
    fn clone(&self) -> Self {
        Self {
            on_connection_lost: Rc::clone(&self.on_connection_lost),
            on_connection_request: Rc::clone(&self.on_connection_request),
            on_peer_message: Rc::clone(&self.on_peer_message),
            on_peer_error: Rc::clone(&self.on_peer_error),
            on_peer_connect: Rc::clone(&self.on_peer_connect),
            on_peer_disconnect: Rc::clone(&self.on_peer_disconnect),
            on_stream_announcement: Rc::clone(&self.on_stream_announcement),
            on_stream_stop: Rc::clone(&self.on_stream_stop),
            log_sink: Rc::clone(&self.log_sink),
        }
    }
}

impl<P, S> fmt::Debug for EventHandlers<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers").finish_non_exhaustive()
    }
}
