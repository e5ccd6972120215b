use crate::application::diagnostics::TransferCounters;
use crate::application::{ConnectionRequest, EventHandlers, SdkLogSink};
use crate::error::display_message;
use crate::infrastructure::{PeerHandle, StreamHandle};
use rainway_demo_core::{
    CommandSender, DemoCommand, LogLevel, PeerId, PeerOrigin, StreamAnnouncement,
};
use std::fmt;
use std::rc::Rc;

/// How inbound connection requests are answered
#[derive(Clone, Default)]
pub enum AcceptPolicy {
    #[default]
    AutoAccept,
    /// Ask the user; the closure returns whether to accept
    Prompt(Rc<dyn Fn(PeerId) -> bool>),
}

impl AcceptPolicy {
    pub fn prompt(decide: impl Fn(PeerId) -> bool + 'static) -> Self {
        AcceptPolicy::Prompt(Rc::new(decide))
    }

    pub fn decide(&self, peer_id: PeerId) -> bool {
        match self {
            AcceptPolicy::AutoAccept => true,
            AcceptPolicy::Prompt(decide) => decide(peer_id),
        }
    }
}

impl fmt::Debug for AcceptPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptPolicy::AutoAccept => write!(f, "AutoAccept"),
            AcceptPolicy::Prompt(_) => write!(f, "Prompt"),
        }
    }
}

/// Builds the SDK callback table
///
/// Every callback only translates its arguments into a [`DemoCommand`] and
/// enqueues it; the reducer applies it on the next poll.
pub struct EventDispatcher<P, S> {
    sender: CommandSender<P, S>,
    policy: AcceptPolicy,
    log_sink: SdkLogSink,
    counters: TransferCounters,
}

impl<P: PeerHandle<Stream = S>, S: StreamHandle> EventDispatcher<P, S> {
    pub fn new(sender: CommandSender<P, S>, policy: AcceptPolicy, log_sink: SdkLogSink) -> Self {
        Self {
            sender,
            policy,
            log_sink,
            counters: TransferCounters::new(),
        }
    }

    /// Count received chat bytes into `counters`
    pub fn with_counters(mut self, counters: TransferCounters) -> Self {
        self.counters = counters;
        self
    }

    pub fn into_handlers(self) -> EventHandlers<P, S> {
        let EventDispatcher {
            sender,
            policy,
            log_sink,
            counters,
        } = self;

        EventHandlers {
            on_connection_lost: {
                let sender = sender.clone();
                Rc::new(move |error: String| {
                    tracing::error!("💥 Gateway connection lost: {}", error);
                    forward(
                        &sender,
                        DemoCommand::SessionEnded {
                            reason: Some(display_message(&error)),
                        },
                    );
                })
            },

            on_connection_request: Rc::new(move |request: ConnectionRequest| {
                let peer_id = request.peer_id();
                if policy.decide(peer_id) {
                    tracing::info!("📞 Accepting connection request from {}", peer_id);
                    request.accept();
                } else {
                    tracing::info!("🚫 Rejecting connection request from {}", peer_id);
                    request.reject();
                }
            }),

            on_peer_message: {
                let sender = sender.clone();
                Rc::new(move |peer_id: PeerId, channel: String, data: Vec<u8>| {
                    tracing::debug!(
                        "📥 {} bytes from {} on '{}'",
                        data.len(),
                        peer_id,
                        channel
                    );
                    counters.add_received(data.len());
                    forward(&sender, DemoCommand::MessageReceived { peer_id, data });
                })
            },

            on_peer_error: {
                let sender = sender.clone();
                Rc::new(move |peer_id: PeerId, reason: String| {
                    forward(&sender, DemoCommand::PeerError { peer_id, reason });
                })
            },

            on_peer_connect: {
                let sender = sender.clone();
                Rc::new(move |peer: P| {
                    let peer_id = peer.peer_id();
                    forward(
                        &sender,
                        DemoCommand::PeerConnected {
                            peer_id,
                            peer,
                            origin: PeerOrigin::Inbound,
                            announcements: Vec::new(),
                        },
                    );
                })
            },

            on_peer_disconnect: {
                let sender = sender.clone();
                Rc::new(move |peer_id: PeerId| {
                    forward(&sender, DemoCommand::PeerLost { peer_id });
                })
            },

            on_stream_announcement: {
                let sender = sender.clone();
                Rc::new(move |peer_id: PeerId, announcement: StreamAnnouncement| {
                    forward(
                        &sender,
                        DemoCommand::StreamAnnounced {
                            peer_id,
                            announcement,
                        },
                    );
                })
            },

            on_stream_stop: Rc::new(move |stream: S| {
                forward(
                    &sender,
                    DemoCommand::StreamStopped {
                        stream_id: stream.id(),
                    },
                );
            }),

            log_sink: Rc::new(move |level: LogLevel, message: String| {
                log_sink.log(level, &message)
            }),
        }
    }
}

/// Queue overflow is already logged by the sender
fn forward<P, S>(sender: &CommandSender<P, S>, cmd: DemoCommand<P, S>) {
    let _ = sender.send(cmd);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diagnostics::TransportStatsSource;
    use crate::infrastructure::mock::{MockPeer, MockStream};
    use rainway_demo_core::{DemoLoop, StreamId};
    use std::cell::Cell;

    type Loop = DemoLoop<MockPeer, MockStream>;

    fn dispatcher(loop_: &Loop, policy: AcceptPolicy) -> EventHandlers<MockPeer, MockStream> {
        EventDispatcher::new(loop_.sender(), policy, SdkLogSink::default()).into_handlers()
    }

    #[test]
    fn test_callbacks_only_enqueue() {
        let loop_ = Loop::new(10, 100);
        let handlers = dispatcher(&loop_, AcceptPolicy::AutoAccept);

        (handlers.on_peer_message)(PeerId::new(1), "Message".to_string(), b"hi".to_vec());
        (handlers.on_peer_disconnect)(PeerId::new(1));
        (handlers.on_peer_error)(PeerId::new(1), "boom".to_string());

        assert_eq!(loop_.pending(), 3);
        assert!(loop_.state().roster().is_empty());
    }

    #[test]
    fn test_connection_lost_strips_error_prefix() {
        let mut loop_ = Loop::new(10, 100);
        let handlers = dispatcher(&loop_, AcceptPolicy::AutoAccept);

        (handlers.on_connection_lost)("Error: RainwayError: socket closed".to_string());
        loop_.poll();

        assert_eq!(loop_.state().session_error(), Some("socket closed"));
    }

    #[test]
    fn test_auto_accept() {
        let loop_ = Loop::new(10, 100);
        let handlers = dispatcher(&loop_, AcceptPolicy::AutoAccept);

        let accepted = Rc::new(Cell::new(false));
        let flag = Rc::clone(&accepted);
        (handlers.on_connection_request)(ConnectionRequest::new(PeerId::new(9), move |ok| {
            flag.set(ok)
        }));

        assert!(accepted.get());
    }

    #[test]
    fn test_prompt_policy_can_reject() {
        let loop_ = Loop::new(10, 100);
        let asked = Rc::new(Cell::new(None));
        let seen = Rc::clone(&asked);
        let handlers = dispatcher(
            &loop_,
            AcceptPolicy::prompt(move |peer_id| {
                seen.set(Some(peer_id));
                false
            }),
        );

        let accepted = Rc::new(Cell::new(true));
        let flag = Rc::clone(&accepted);
        (handlers.on_connection_request)(ConnectionRequest::new(PeerId::new(9), move |ok| {
            flag.set(ok)
        }));

        assert_eq!(asked.get(), Some(PeerId::new(9)));
        assert!(!accepted.get());
    }

    #[test]
    fn test_announcement_forwarded() {
        let loop_ = Loop::new(10, 100);
        let handlers = dispatcher(&loop_, AcceptPolicy::AutoAccept);

        (handlers.on_stream_announcement)(
            PeerId::new(3),
            StreamAnnouncement::new(StreamId::new(), None),
        );

        assert_eq!(loop_.pending(), 1);
    }

    #[test]
    fn test_received_bytes_counted() {
        let loop_ = Loop::new(10, 100);
        let counters = TransferCounters::new();
        let handlers = EventDispatcher::new(
            loop_.sender(),
            AcceptPolicy::AutoAccept,
            SdkLogSink::default(),
        )
        .with_counters(counters.clone())
        .into_handlers();

        (handlers.on_peer_message)(PeerId::new(1), "Message".to_string(), vec![0; 12]);

        assert_eq!(counters.sample().bytes_received, 12);
    }
}
