use instant::Instant;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp in milliseconds since application start (monotonic)
///
/// Uses `instant::Instant` so the same code runs natively and in the browser.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp representing the current moment
    pub fn now() -> Self {
        static ANCHOR: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
        let anchor = ANCHOR.get_or_init(Instant::now);

        let elapsed = Instant::now().duration_since(*anchor);
        Timestamp(elapsed.as_millis() as u64)
    }

    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Direction tag of a chat line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    /// Received from the remote peer
    Incoming,
    /// Sent by us
    Outgoing,
    /// Local status line, never sent over the wire
    Info,
}

impl fmt::Display for ChatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatKind::Incoming => write!(f, "incoming"),
            ChatKind::Outgoing => write!(f, "outgoing"),
            ChatKind::Info => write!(f, "info"),
        }
    }
}

/// One line of a peer's chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChatEntry {
    #[serde(rename = "type")]
    kind: ChatKind,
    message: String,
    at: Timestamp,
}

impl ChatEntry {
    pub fn new(kind: ChatKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            at: Timestamp::now(),
        }
    }

    pub fn incoming(message: impl Into<String>) -> Self {
        Self::new(ChatKind::Incoming, message)
    }

    pub fn outgoing(message: impl Into<String>) -> Self {
        Self::new(ChatKind::Outgoing, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ChatKind::Info, message)
    }

    /// Decode a raw data-channel payload as UTF-8 (invalid sequences are replaced)
    pub fn decode_incoming(data: &[u8]) -> Self {
        Self::incoming(String::from_utf8_lossy(data).into_owned())
    }

    pub fn kind(&self) -> ChatKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn at(&self) -> Timestamp {
        self.at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_tag_kind() {
        assert_eq!(ChatEntry::incoming("a").kind(), ChatKind::Incoming);
        assert_eq!(ChatEntry::outgoing("b").kind(), ChatKind::Outgoing);
        assert_eq!(ChatEntry::info("c").kind(), ChatKind::Info);
    }

    #[test]
    fn test_decode_utf8() {
        let entry = ChatEntry::decode_incoming("grüß dich".as_bytes());
        assert_eq!(entry.message(), "grüß dich");
        assert_eq!(entry.kind(), ChatKind::Incoming);
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let entry = ChatEntry::decode_incoming(&[b'h', 0xff, b'i']);
        assert_eq!(entry.message(), "h\u{fffd}i");
    }

    #[test]
    fn test_serialized_shape() {
        let entry = ChatEntry::outgoing("hi");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "outgoing");
        assert_eq!(json["message"], "hi");
    }

    #[test]
    fn test_timestamp_ordering() {
        let t1 = Timestamp::from_millis(100);
        let t2 = Timestamp::from_millis(200);
        assert!(t1 < t2);
        assert_eq!(t2.to_string(), "200ms");
    }
}
