use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progression of a peer widget
///
/// Variants are declared in ascending order; comparisons such as
/// `state >= WidgetState::ConnectedNoStream` are part of the contract.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum WidgetState {
    #[default]
    Disconnected,
    ConnectingToHost,
    ConnectedNoStream,
    /// Connected, but the peer reported it cannot host a stream
    ConnectedCantStream,
    ConnectedReadyToStream,
    Streaming,
}

impl WidgetState {
    /// Human readable status line shown in the widget header
    pub fn description(&self) -> &'static str {
        match self {
            WidgetState::Disconnected => "Disconnected",
            WidgetState::ConnectingToHost => "Connecting to host...",
            WidgetState::ConnectedNoStream => "Connected (preparing stream...)",
            WidgetState::ConnectedCantStream => "Connected (cannot stream)",
            WidgetState::ConnectedReadyToStream => "Connected (ready to stream)",
            WidgetState::Streaming => "Streaming",
        }
    }

    /// A live peer handle must exist in this state
    pub fn has_peer(&self) -> bool {
        *self >= WidgetState::ConnectedNoStream
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, WidgetState::Streaming)
    }

    pub fn controls(&self) -> WidgetControls {
        WidgetControls::for_state(*self)
    }
}

impl fmt::Display for WidgetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Which control groups of a widget are enabled in a given state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetControls {
    /// Peer id input and connect button
    pub when_no_host: bool,
    /// Disconnect / cancel button
    pub when_host_or_connecting: bool,
    /// Chat input and send button
    pub when_host: bool,
    /// Start stream button
    pub when_ready_to_stream: bool,
    /// Stop, fullscreen, pause and stats buttons
    pub when_streaming: bool,
}

impl WidgetControls {
    pub fn for_state(state: WidgetState) -> Self {
        Self {
            when_no_host: state == WidgetState::Disconnected,
            when_host_or_connecting: state >= WidgetState::ConnectingToHost,
            when_host: state >= WidgetState::ConnectedNoStream,
            when_ready_to_stream: state == WidgetState::ConnectedReadyToStream,
            when_streaming: state >= WidgetState::Streaming,
        }
    }
}

/// Connection state of the session (runtime) handle
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "Disconnected"),
            SessionState::Connecting => write!(f, "Connecting…"),
            SessionState::Connected => write!(f, "Connected"),
        }
    }
}
