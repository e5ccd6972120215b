use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use uuid::Uuid;

/// Local identity of a stream handle, used to route SDK stream-stop events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct StreamId(Uuid);

impl StreamId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for StreamId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input capabilities granted to the host when requesting a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct InputLevel(u32);

impl InputLevel {
    pub const NONE: InputLevel = InputLevel(0);
    pub const MOUSE: InputLevel = InputLevel(1);
    pub const KEYBOARD: InputLevel = InputLevel(1 << 1);
    pub const GAMEPAD: InputLevel = InputLevel(1 << 2);
    pub const ALL: InputLevel = InputLevel(1 | (1 << 1) | (1 << 2));

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: InputLevel) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for InputLevel {
    type Output = InputLevel;

    fn bitor(self, rhs: Self) -> Self::Output {
        InputLevel(self.0 | rhs.0)
    }
}

impl Default for InputLevel {
    fn default() -> Self {
        InputLevel::ALL
    }
}

/// Delivery mode of a peer data channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum DataChannelMode {
    Reliable,
    Unreliable,
}

impl fmt::Display for DataChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataChannelMode::Reliable => write!(f, "Reliable"),
            DataChannelMode::Unreliable => write!(f, "Unreliable"),
        }
    }
}

/// Label of the reliable channel chat messages travel on
pub const CHAT_CHANNEL: &str = "Message";

/// A stream a peer offers to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StreamAnnouncement {
    pub stream_id: StreamId,
    #[serde(default)]
    pub name: Option<String>,
}

impl StreamAnnouncement {
    pub fn new(stream_id: StreamId, name: Option<String>) -> Self {
        Self { stream_id, name }
    }

    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("Stream {}", self.stream_id),
        }
    }
}

/// Playback controls forwarded to an active stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamControl {
    Fullscreen,
    Pause,
    Play,
    StatsOverlay(bool),
    Gestures(bool),
}

/// Why a stream handle left its widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseReason {
    /// The user stopped the stream
    Local,
    /// The SDK reported the stream stopped
    Stopped,
    /// The peer connection went away
    PeerGone,
    /// The whole session was torn down
    SessionEnded,
}

impl ReleaseReason {
    /// Whether the SDK still has to be told that we are leaving
    pub fn requires_leave(&self) -> bool {
        !matches!(self, ReleaseReason::Stopped)
    }

    /// Whether a released peer handle still has to be disconnected
    pub fn requires_disconnect(&self) -> bool {
        matches!(self, ReleaseReason::Local | ReleaseReason::SessionEnded)
    }
}

/// A stream handle attached to a widget
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveStream<S> {
    pub id: StreamId,
    pub handle: S,
}

impl<S> ActiveStream<S> {
    pub fn new(id: StreamId, handle: S) -> Self {
        Self { id, handle }
    }
}
