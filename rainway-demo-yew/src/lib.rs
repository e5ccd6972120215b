//! # Rainway Demo Yew Components
//!
//! Browser front end of the Rainway peer-to-peer streaming demo.

pub mod app;
pub mod components;
pub mod hooks;
pub mod pages;
pub mod providers;
pub mod storage;

use rainway_demo_core::DemoState;
use rainway_demo_sdk::infrastructure::web::{WebConnector, WebPeer, WebStream};
use rainway_demo_sdk::DemoSession;

/// Session driving the real SDK
pub type WebSession = DemoSession<WebConnector>;

/// Snapshot of the demo state rendered by the components
pub type WebState = DemoState<WebPeer, WebStream>;

/// Crate version shown in the page header
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-exports for convenience
pub use app::{load_config, tracing_level, App, AppProps, ConfigLoadError};
pub use components::{ChatBox, PeerConnectForm, PeerWidget, SessionBar, StatusBadge, StreamView};
pub use hooks::{use_demo, use_persisted, DemoContext};
pub use pages::{DemoScreen, QuickConnect};
pub use providers::{DemoProvider, DemoProviderProps};
pub use storage::LocalStorageStore;
