//! # Scheduled task.
//!
//! A [`Task`] pairs a [`Callback`] with an identity, a due time and a repeat
//! interval. Tasks are created by the scheduler and owned by it until they are
//! removed by id or finish (`Done`/`Fail`); they are never copied.

use std::time::Duration;

use tokio::time::Instant;

use crate::tasks::callback::Callback;
use crate::tasks::outcome::TaskOutcome;
use crate::tasks::uid::Uid;

/// Schedulable unit of work.
pub struct Task {
    id: Uid,
    due: Instant,
    interval: Duration,
    callback: Box<dyn Callback>,
}

impl Task {
    pub(crate) fn new(callback: Box<dyn Callback>, due: Instant, interval: Duration) -> Self {
        Self {
            id: Uid::new(),
            due,
            interval,
            callback,
        }
    }

    /// Identity used to remove the task.
    pub fn id(&self) -> Uid {
        self.id
    }

    /// Instant at which the task becomes eligible to run.
    pub fn due(&self) -> Instant {
        self.due
    }

    /// Delay between the end of one execution and the next due time.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Name of the callback.
    pub fn name(&self) -> &str {
        self.callback.name()
    }

    pub(crate) fn run(&mut self) -> TaskOutcome {
        self.callback.call()
    }

    /// Anchors the next due time to *now*, not to the previous due time.
    pub(crate) fn reschedule(&mut self) {
        self.due = Instant::now() + self.interval;
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("due", &self.due)
            .field("interval", &self.interval)
            .finish()
    }
}
