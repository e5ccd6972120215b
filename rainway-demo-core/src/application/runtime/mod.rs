mod command_queue;
mod demo_loop;

pub use command_queue::{CommandQueue, CommandSender, QueueError, DEFAULT_QUEUE_SIZE};
pub use demo_loop::DemoLoop;
