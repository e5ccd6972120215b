use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a remote peer as assigned by the Rainway gateway.
///
/// Peer ids are 64-bit values that do not fit into a JavaScript number, so
/// they travel as decimal strings on the UI side and as `u64` here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct PeerId(u64);

/// Errors that can occur when parsing a peer id typed by the user
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PeerIdError {
    #[error("Peer ID cannot be empty")]
    Empty,

    #[error("Peer ID must be a decimal number: {0}")]
    NotANumber(String),
}

impl PeerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Short form used as a speaker label in chat boxes (last six digits)
    pub fn nickname(&self) -> String {
        let full = self.0.to_string();
        let start = full.len().saturating_sub(6);
        full[start..].to_string()
    }
}

impl FromStr for PeerId {
    type Err = PeerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PeerIdError::Empty);
        }

        trimmed
            .parse::<u64>()
            .map(PeerId)
            .map_err(|_| PeerIdError::NotANumber(trimmed.to_string()))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PeerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// How a roster entry came into existence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum PeerOrigin {
    /// We dialed the peer from the connect form
    Outbound,
    /// The peer dialed us and the request was accepted
    Inbound,
}

impl fmt::Display for PeerOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerOrigin::Outbound => write!(f, "Outbound"),
            PeerOrigin::Inbound => write!(f, "Inbound"),
        }
    }
}
