pub mod application;
pub mod config;
pub mod domain;

pub use application::runtime::{CommandQueue, CommandSender, DemoLoop, QueueError};
pub use application::{DemoCommand, DemoEvent, DemoEventLoop};
pub use config::{
    peer_id_storage_key, resolve_initial_fields, ConfigError, DemoConfig, InitialFields,
    KeyValueStore, LogLevel, MemoryStore, API_KEY_STORAGE_KEY,
};
pub use domain::{
    ActiveStream, ChatEntry, ChatKind, DataChannelMode, DemoState, InputLevel, PeerId,
    PeerIdError, PeerOrigin, ReleaseReason, Roster, RosterEntry, RosterError, SessionState,
    StreamAnnouncement, StreamControl, StreamId, Timestamp, WidgetControls, WidgetState,
    CHAT_CHANNEL,
};
