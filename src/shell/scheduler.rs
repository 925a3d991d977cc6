//! Debounced reconciliation scheduling
//!
//! Any number of requests between two passes collapse into one deferred
//! callback. The pass clears the pending flag before it starts, so a request
//! made while it runs schedules a fresh, later pass.

use calloop::{Idle, LoopHandle};
use log::trace;
use std::cell::Cell;
use std::rc::Rc;

/// Host hook that runs the reconciliation pass once, later.
pub trait IdleSource {
    fn schedule(&mut self);
    fn cancel(&mut self);
}

pub struct ReconcileScheduler {
    pending: bool,
    source: Box<dyn IdleSource>,
}

impl ReconcileScheduler {
    pub fn new(source: Box<dyn IdleSource>) -> Self {
        Self {
            pending: false,
            source,
        }
    }

    /// Returns `true` when this call registered the callback.
    pub fn request(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        self.source.schedule();
        trace!("Reconciliation scheduled");
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub(crate) fn begin_pass(&mut self) {
        self.pending = false;
    }

    /// Deregister a callback that has not run yet.
    pub fn shutdown(&mut self) {
        if self.pending {
            self.source.cancel();
            self.pending = false;
        }
    }
}

/// calloop idle callback running `callback` on the loop's shared data.
pub struct LoopIdle<D: 'static> {
    handle: LoopHandle<'static, D>,
    callback: fn(&mut D),
    pending: Option<Idle<'static>>,
}

impl<D: 'static> LoopIdle<D> {
    pub fn new(handle: LoopHandle<'static, D>, callback: fn(&mut D)) -> Self {
        Self {
            handle,
            callback,
            pending: None,
        }
    }
}

impl<D: 'static> IdleSource for LoopIdle<D> {
    fn schedule(&mut self) {
        let callback = self.callback;
        self.pending = Some(self.handle.insert_idle(move |data| callback(data)));
    }

    fn cancel(&mut self) {
        if let Some(idle) = self.pending.take() {
            idle.cancel();
        }
    }
}

/// Idle source driven by hand. Counts registrations so callers can check
/// how many passes were requested.
#[derive(Debug, Clone, Default)]
pub struct ManualIdle {
    scheduled: Rc<Cell<usize>>,
    cancelled: Rc<Cell<usize>>,
}

impl ManualIdle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> usize {
        self.scheduled.get()
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.get()
    }
}

impl IdleSource for ManualIdle {
    fn schedule(&mut self) {
        self.scheduled.set(self.scheduled.get() + 1);
    }

    fn cancel(&mut self) {
        self.cancelled.set(self.cancelled.get() + 1);
    }
}
