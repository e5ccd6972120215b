mod demo_screen;
mod quick_connect;

pub use demo_screen::DemoScreen;
pub use quick_connect::{QuickConnect, QuickConnectProps};
