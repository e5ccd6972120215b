pub mod diagnostics;
mod dispatcher;
mod handlers;
mod log_sink;
mod session;

pub use dispatcher::{AcceptPolicy, EventDispatcher};
pub use handlers::{ConnectionRequest, EventHandlers};
pub use log_sink::SdkLogSink;
pub use session::{DemoSession, PollReport};
