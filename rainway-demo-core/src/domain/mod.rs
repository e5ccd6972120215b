pub mod chat;
pub mod peer;
pub mod roster;
pub mod state;
pub mod stream;
pub mod widget;

pub use chat::{ChatEntry, ChatKind, Timestamp};
pub use peer::{PeerId, PeerIdError, PeerOrigin};
pub use roster::{Roster, RosterEntry, RosterError};
pub use state::DemoState;
pub use stream::{
    ActiveStream, DataChannelMode, InputLevel, ReleaseReason, StreamAnnouncement, StreamControl,
    StreamId, CHAT_CHANNEL,
};
pub use widget::{SessionState, WidgetControls, WidgetState};
