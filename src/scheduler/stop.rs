//! # Running flag shared between the scheduler and its controllers.
//!
//! [`StopHandle`] is a cloneable handle over one atomic flag. Clearing it is a single
//! atomic store: no allocation, no locking, no I/O. It is therefore safe to call from
//! a callback dispatched by the same scheduler, from another thread, or from a signal
//! listener.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable handle that stops a [`Scheduler`](crate::Scheduler) run loop.
///
/// The loop observes the flag at its next condition check; a callback that is already
/// executing is never preempted.
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Creates a handle in the "not running" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the running flag.
    #[inline]
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// True while a run loop is active and has not been asked to stop.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn start(&self) {
        self.running.store(true, Ordering::Release);
    }
}
