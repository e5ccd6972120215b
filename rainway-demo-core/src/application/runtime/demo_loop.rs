use crate::application::runtime::{CommandQueue, CommandSender, QueueError};
use crate::application::{DemoCommand, DemoEvent, DemoEventLoop};
use crate::domain::DemoState;
use std::cell::RefCell;
use std::rc::Rc;

/// Demo event loop - processes queued commands in batches
pub struct DemoLoop<P, S> {
    /// Stateful reducer (owns session state and roster)
    event_loop: DemoEventLoop<P, S>,

    /// Inbound command queue, shared with every [`CommandSender`]
    inbound: Rc<RefCell<CommandQueue<P, S>>>,

    /// Outbound event queue (caller drains this)
    outbound: Vec<DemoEvent<P, S>>,

    /// Max commands to process per poll
    batch_size: usize,
}

impl<P, S> DemoLoop<P, S> {
    pub fn new(batch_size: usize, max_queue_size: usize) -> Self {
        Self {
            event_loop: DemoEventLoop::new(),
            inbound: Rc::new(RefCell::new(CommandQueue::new(max_queue_size))),
            outbound: Vec::new(),
            batch_size,
        }
    }

    /// Handle for enqueueing commands from callbacks
    pub fn sender(&self) -> CommandSender<P, S> {
        CommandSender::new(Rc::clone(&self.inbound))
    }

    /// Submit a command (non-blocking)
    pub fn submit(&self, cmd: DemoCommand<P, S>) -> Result<(), QueueError> {
        self.inbound.borrow_mut().push(cmd)
    }

    /// Process up to `batch_size` commands
    /// Returns number of commands processed
    pub fn poll(&mut self) -> usize {
        let mut processed = 0;

        while processed < self.batch_size {
            // Release the queue borrow before the reducer runs
            let next = self.inbound.borrow_mut().pop();
            match next {
                Some(cmd) => {
                    let events = self.event_loop.handle_command(cmd);
                    self.outbound.extend(events);
                    processed += 1;
                }
                None => break,
            }
        }

        processed
    }

    /// Apply a command right away and return its events
    ///
    /// Commands already waiting in the queue are processed first so ordering is
    /// preserved; their events stay in the outbound queue.
    pub fn apply(&mut self, cmd: DemoCommand<P, S>) -> Vec<DemoEvent<P, S>> {
        while self.poll() > 0 {}
        self.event_loop.handle_command(cmd)
    }

    /// Drain all emitted events (caller's responsibility)
    pub fn drain_events(&mut self) -> Vec<DemoEvent<P, S>> {
        std::mem::take(&mut self.outbound)
    }

    pub fn pending(&self) -> usize {
        self.inbound.borrow().len()
    }

    /// Get reference to event loop (for queries)
    pub fn event_loop(&self) -> &DemoEventLoop<P, S> {
        &self.event_loop
    }

    pub fn state(&self) -> &DemoState<P, S> {
        self.event_loop.state()
    }
}

impl<P, S> std::fmt::Debug for DemoLoop<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoLoop")
            .field("pending", &self.pending())
            .field("outbound", &self.outbound.len())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}
