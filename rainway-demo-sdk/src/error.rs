use rainway_demo_core::{PeerIdError, QueueError, RosterError};

/// Errors surfaced by the SDK boundary and the session orchestrator
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("Runtime initialization failed: {0}")]
    Initialization(String),

    #[error("Gateway connection failed: {0}")]
    Gateway(String),

    #[error("Peer connection failed: {0}")]
    PeerConnection(String),

    #[error("Data channel error: {0}")]
    DataChannel(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("No active session")]
    NoSession,

    #[error("A session connection is already in progress")]
    ConnectInFlight,

    /// The demo state refused the action
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("Invalid peer ID: {0}")]
    InvalidPeerId(#[from] PeerIdError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl SdkError {
    /// Message suitable for display next to a form
    pub fn display_message(&self) -> String {
        display_message(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SdkError>;

/// Strip a leading `...Error: ` chain from an error string
///
/// `"Runtime initialization failed: RainwayError: Invalid API key"` becomes
/// `"Invalid API key"`. Strings without the marker are returned unchanged.
pub fn display_message(raw: &str) -> String {
    const MARKER: &str = "Error: ";

    match raw.rfind(MARKER) {
        Some(index) => raw[index + MARKER.len()..].to_string(),
        None => raw.to_string(),
    }
}
