mod commands;
mod event_loop;
mod events;
pub mod runtime;

pub use commands::DemoCommand;
pub use event_loop::DemoEventLoop;
pub use events::DemoEvent;
