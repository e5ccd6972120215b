pub mod application;
pub mod error;
pub mod infrastructure;

pub use application::diagnostics::{StatsRecorder, TransferCounters, TransportStatsSource};
pub use application::{
    AcceptPolicy, ConnectionRequest, DemoSession, EventDispatcher, EventHandlers, PollReport,
    SdkLogSink,
};
pub use error::{display_message, Result, SdkError};
pub use infrastructure::{
    Connector, PeerHandle, PeerOf, Runtime, RuntimeOptions, StreamHandle, StreamOf,
};
