mod use_demo;
mod use_persisted;

pub(crate) use use_demo::drain_events;
pub use use_demo::{use_demo, DemoContext};
pub use use_persisted::use_persisted;
