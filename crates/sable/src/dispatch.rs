//! Marshalling of work onto the UI execution context.
//!
//! The [`UiDispatcher`] is owned by the thread that created it and drains a
//! FIFO queue of work items. Any thread may hold a [`DispatchHandle`] and
//! enqueue work; enqueued work never runs anywhere but the owning thread.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, ThreadId};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Unit of work executed on the UI context.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Errors raised by the dispatcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The queue was drained from a thread other than its owner.
    #[error("dispatcher queue drained off the UI thread")]
    WrongContext,
}

/// Cloneable callback enqueuing work for the UI context.
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    sender: Sender<Work>,
    owner: ThreadId,
}

impl DispatchHandle {
    /// Queues `work`, returning false if the dispatcher no longer exists.
    pub fn dispatch<F>(&self, work: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let delivered = self.sender.send(Box::new(work)).is_ok();
        if !delivered {
            debug!(target: DISPATCH_TARGET, "dropping work for a closed dispatcher");
        }
        delivered
    }

    /// Returns true when called on the UI context.
    #[must_use]
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.owner
    }
}

/// Work queue owned by the UI context.
#[derive(Debug)]
pub struct UiDispatcher {
    sender: Sender<Work>,
    receiver: Receiver<Work>,
    owner: ThreadId,
}

impl Default for UiDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl UiDispatcher {
    /// Creates a dispatcher owned by the calling thread.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            owner: thread::current().id(),
        }
    }

    /// Returns a handle other threads can use to enqueue work.
    #[must_use]
    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle {
            sender: self.sender.clone(),
            owner: self.owner,
        }
    }

    /// Runs every queued item, returning how many ran.
    pub fn pump(&self) -> Result<usize, DispatchError> {
        self.ensure_owner()?;
        Ok(self.drain(0))
    }

    /// Waits up to `timeout` for work, then runs everything queued.
    pub fn pump_for(&self, timeout: Duration) -> Result<usize, DispatchError> {
        self.ensure_owner()?;
        let Ok(work) = self.receiver.recv_timeout(timeout) else {
            return Ok(0);
        };
        work();
        Ok(self.drain(1))
    }

    fn drain(&self, mut ran: usize) -> usize {
        while let Ok(work) = self.receiver.try_recv() {
            work();
            ran += 1;
        }
        ran
    }

    fn ensure_owner(&self) -> Result<(), DispatchError> {
        if thread::current().id() == self.owner {
            Ok(())
        } else {
            Err(DispatchError::WrongContext)
        }
    }
}
