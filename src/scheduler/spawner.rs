//! # Adding tasks while the scheduler is running.
//!
//! [`Scheduler::run`](crate::Scheduler::run) holds the scheduler mutably, so a
//! callback cannot call `add_task` directly. It adds through a [`Spawner`] instead:
//! the task is built (and its id assigned) immediately, parked in a shared pending
//! list, and moved into the queue by the run loop right after the callback returns,
//! before a `Repeat` task is re-enqueued.
//!
//! A spawned task takes part in the same capacity limit as every other push, so a
//! callback that fills the queue makes its own re-enqueue fail.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::tasks::{Callback, Task, Uid};

/// Cloneable handle that adds tasks to a [`Scheduler`](crate::Scheduler).
#[derive(Clone, Debug, Default)]
pub struct Spawner {
    pending: Arc<Mutex<Vec<Task>>>,
}

impl Spawner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Parks a task for the scheduler and returns its id.
    ///
    /// The id is final, but the task only becomes visible to `len`, `contains` and
    /// `remove_task` once the scheduler picks it up. If the queue refuses it at that
    /// point, a `TaskAddFailed` event is published and the task is dropped.
    pub fn spawn<C: Callback>(&self, callback: C, start: Instant, interval: Duration) -> Uid {
        let task = Task::new(Box::new(callback), start, interval);
        let id = task.id();
        self.lock().push(task);
        id
    }

    /// Takes every parked task, oldest first.
    pub(crate) fn take(&self) -> Vec<Task> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Task>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{TaskFn, TaskOutcome};

    #[test]
    fn test_clones_share_pending_list() {
        let a = Spawner::new();
        let b = a.clone();

        let now = Instant::now();
        let first = a.spawn(TaskFn::new("one", || TaskOutcome::Done), now, Duration::ZERO);
        let second = b.spawn(TaskFn::new("two", || TaskOutcome::Done), now, Duration::ZERO);

        let taken = a.take();
        assert_eq!(
            taken.iter().map(Task::id).collect::<Vec<_>>(),
            vec![first, second]
        );
        assert!(b.take().is_empty());
    }
}
