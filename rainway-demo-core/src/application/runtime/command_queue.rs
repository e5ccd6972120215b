use crate::application::DemoCommand;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Default capacity of the inbound command queue
pub const DEFAULT_QUEUE_SIZE: usize = 1024;

/// Synchronous FIFO command queue (no async, works in any runtime)
#[derive(Debug)]
pub struct CommandQueue<P, S> {
    queue: VecDeque<DemoCommand<P, S>>,
    max_size: usize,
}

impl<P, S> CommandQueue<P, S> {
    pub fn new(max_size: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(max_size.min(DEFAULT_QUEUE_SIZE)),
            max_size,
        }
    }

    /// Push a command (returns error if full)
    pub fn push(&mut self, cmd: DemoCommand<P, S>) -> Result<(), QueueError> {
        if self.queue.len() >= self.max_size {
            return Err(QueueError::Full { max: self.max_size });
        }
        self.queue.push_back(cmd);
        Ok(())
    }

    /// Pop next command
    pub fn pop(&mut self) -> Option<DemoCommand<P, S>> {
        self.queue.pop_front()
    }

    /// Drain all commands (for batch processing)
    pub fn drain(&mut self) -> Vec<DemoCommand<P, S>> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

impl<P, S> Default for CommandQueue<P, S> {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_SIZE)
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum QueueError {
    #[error("Queue is full (max size: {max})")]
    Full { max: usize },
}

/// Cloneable handle that SDK callbacks use to enqueue commands
///
/// Callbacks never touch the demo state directly; they only push here and the
/// owning [`DemoLoop`](super::DemoLoop) applies the commands in arrival order.
pub struct CommandSender<P, S> {
    queue: Rc<RefCell<CommandQueue<P, S>>>,
}

impl<P, S> CommandSender<P, S> {
    pub(crate) fn new(queue: Rc<RefCell<CommandQueue<P, S>>>) -> Self {
        Self { queue }
    }

    /// Enqueue a command, logging a warning when the queue overflows
    pub fn send(&self, cmd: DemoCommand<P, S>) -> Result<(), QueueError> {
        let name = cmd.name();
        let result = self.queue.borrow_mut().push(cmd);
        if let Err(e) = &result {
            tracing::warn!("Dropping {}: {}", name, e);
        }
        result
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl<P, S> Clone for CommandSender<P, S> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
        }
    }
}

impl<P, S> std::fmt::Debug for CommandSender<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSender")
            .field("pending", &self.pending())
            .finish()
    }
}
