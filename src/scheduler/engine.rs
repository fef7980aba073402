//! # Scheduler: owns tasks and dispatches them by due time.
//!
//! [`Scheduler`] keeps every queued [`Task`] in an arena and orders them through a
//! [`PriorityQueue`] of `(due, slot)` entries. [`Scheduler::run`] blocks (asynchronously)
//! until each task's due time, calls it, and applies its [`TaskOutcome`].
//!
//! ## Rules
//! - Ordering is by due time only; ties come out in heap order, not insertion order.
//! - `Repeat` is drift-tolerant: the next due time is `completion + interval`.
//! - `Fail` is reported on the bus and never ends the loop.
//! - Clearing the running flag (from a callback or elsewhere) ends the loop at the
//!   next condition check, even if more tasks are already due.
//! - A `Stopped` scheduler keeps its tasks; calling `run` again resumes them.
//! - Tasks added through a [`Spawner`] enter the queue after the callback that added
//!   them returns and before that callback's own task is re-enqueued.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio::time::Instant;
//! use pairvisor::{RunOutcome, Scheduler, TaskFn, TaskOutcome};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut sched = Scheduler::new();
//!     let mut left = 3;
//!     sched.add_task(
//!         TaskFn::new("countdown", move || {
//!             left -= 1;
//!             if left == 0 { TaskOutcome::Done } else { TaskOutcome::Repeat }
//!         }),
//!         Instant::now(),
//!         Duration::from_millis(5),
//!     );
//!
//!     assert_eq!(sched.run().await, RunOutcome::Complete);
//!     assert!(sched.is_empty());
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};

use crate::{
    error::{QueueError, SchedulerError},
    events::{Bus, Event, EventKind},
    queue::PriorityQueue,
    scheduler::{arena::Arena, spawner::Spawner, stop::StopHandle},
    tasks::{Callback, Task, TaskOutcome, Uid},
};

/// Why [`Scheduler::run`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The queue emptied while the scheduler was still running.
    Complete,
    /// The running flag was cleared.
    Stopped,
}

/// Heap entry: a copy of the due time plus the arena slot holding the task.
#[derive(Clone, Copy, Debug)]
struct Entry {
    due: Instant,
    slot: usize,
}

type Queue = PriorityQueue<Entry, fn(&Entry, &Entry) -> bool>;

fn due_first(a: &Entry, b: &Entry) -> bool {
    a.due < b.due
}

/// Single-owner, time-ordered task scheduler.
pub struct Scheduler {
    queue: Queue,
    tasks: Arena,
    running: StopHandle,
    spawned: Spawner,
    bus: Bus,
}

impl Scheduler {
    /// Creates an empty, not-running scheduler with a private event bus.
    pub fn new() -> Self {
        Self::with_bus(Bus::new(1))
    }

    /// Creates an empty, not-running scheduler publishing to `bus`.
    pub fn with_bus(bus: Bus) -> Self {
        Self {
            queue: PriorityQueue::new(due_first as fn(&Entry, &Entry) -> bool),
            tasks: Arena::default(),
            running: StopHandle::new(),
            spawned: Spawner::new(),
            bus,
        }
    }

    /// Caps the number of queued tasks; pushes beyond `limit` fail.
    ///
    /// Tasks already queued are carried over in due order. Those beyond `limit` are
    /// dropped and reported as `TaskAddFailed`.
    pub fn with_capacity_limit(mut self, limit: usize) -> Self {
        let mut old = std::mem::replace(
            &mut self.queue,
            PriorityQueue::with_limit(due_first as fn(&Entry, &Entry) -> bool, limit),
        );
        while let Some(entry) = old.pop() {
            if let Err(e) = self.queue.push(entry) {
                if let Some(task) = self.tasks.remove(entry.slot) {
                    self.bus.publish(
                        Event::new(EventKind::TaskAddFailed)
                            .with_task(task.name())
                            .with_reason(e.to_string()),
                    );
                }
            }
        }
        self
    }

    /// Returns a handle that can stop [`run`](Self::run) from anywhere.
    pub fn stop_handle(&self) -> StopHandle {
        self.running.clone()
    }

    /// Returns a handle that adds tasks from inside callbacks.
    pub fn spawner(&self) -> Spawner {
        self.spawned.clone()
    }

    /// Enqueues a task; returns its id, or [`Uid::bad`] if it could not be enqueued.
    ///
    /// On failure the task is dropped immediately and a `TaskAddFailed` event is
    /// published.
    pub fn add_task<C: Callback>(
        &mut self,
        callback: C,
        start: Instant,
        interval: Duration,
    ) -> Uid {
        self.try_add_task(callback, start, interval)
            .unwrap_or_else(|_| Uid::bad())
    }

    /// Enqueues a task, reporting why it could not be enqueued.
    pub fn try_add_task<C: Callback>(
        &mut self,
        callback: C,
        start: Instant,
        interval: Duration,
    ) -> Result<Uid, SchedulerError> {
        self.admit(Task::new(Box::new(callback), start, interval))
    }

    /// Removes and drops the task with the given id.
    ///
    /// Returns [`SchedulerError::NotFound`] (queue unchanged) if no queued task matches.
    pub fn remove_task(&mut self, id: Uid) -> Result<(), SchedulerError> {
        let tasks = &self.tasks;
        let entry = self
            .queue
            .remove_matching(|e| tasks.get(e.slot).is_some_and(|t| t.id() == id))
            .ok_or(SchedulerError::NotFound { id })?;

        if let Some(task) = self.tasks.remove(entry.slot) {
            self.bus
                .publish(Event::new(EventKind::TaskRemoved).with_task(task.name()));
        }
        Ok(())
    }

    /// True if a task with the given id is queued.
    pub fn contains(&self, id: Uid) -> bool {
        self.queue
            .iter()
            .any(|e| self.tasks.get(e.slot).is_some_and(|t| t.id() == id))
    }

    /// Runs queued tasks in due-time order until the queue empties or the scheduler
    /// is stopped.
    pub async fn run(&mut self) -> RunOutcome {
        self.running.start();
        self.admit_spawned();

        while !self.queue.is_empty() && self.running.is_running() {
            let Some(next) = self.queue.peek().copied() else {
                break;
            };
            wait_until(next.due).await;

            let Some(entry) = self.queue.pop() else {
                break;
            };
            let Some(mut task) = self.tasks.remove(entry.slot) else {
                continue;
            };

            let outcome = task.run();
            self.admit_spawned();

            match outcome {
                TaskOutcome::Done => {}
                TaskOutcome::Fail => {
                    self.bus
                        .publish(Event::new(EventKind::TaskFailed).with_task(task.name()));
                }
                TaskOutcome::Repeat => {
                    task.reschedule();
                    let name = task.name().to_owned();
                    if let Err(e) = self.enqueue(task) {
                        self.bus.publish(
                            Event::new(EventKind::TaskRequeueFailed)
                                .with_task(name)
                                .with_reason(e.to_string()),
                        );
                    }
                }
            }
        }

        if self.running.is_running() {
            RunOutcome::Complete
        } else {
            self.bus.publish(Event::new(EventKind::SchedulerStopped));
            RunOutcome::Stopped
        }
    }

    /// Clears the running flag; see [`StopHandle::stop`].
    pub fn stop(&self) {
        self.running.stop();
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if no task is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drops every queued task, including tasks parked by a [`Spawner`].
    pub fn clear(&mut self) {
        self.queue.clear();
        self.tasks.clear();
        drop(self.spawned.take());
    }

    /// Enqueues `task`, publishing `TaskAdded` or `TaskAddFailed`.
    fn admit(&mut self, task: Task) -> Result<Uid, SchedulerError> {
        let id = task.id();
        let name = task.name().to_owned();

        match self.enqueue(task) {
            Ok(()) => {
                self.bus
                    .publish(Event::new(EventKind::TaskAdded).with_task(name));
                Ok(id)
            }
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::TaskAddFailed)
                        .with_task(name)
                        .with_reason(e.to_string()),
                );
                Err(e.into())
            }
        }
    }

    /// Moves tasks parked by the [`Spawner`] into the queue.
    fn admit_spawned(&mut self) {
        for task in self.spawned.take() {
            let _ = self.admit(task);
        }
    }

    /// Stores `task` and pushes its entry; drops the task if the push fails.
    fn enqueue(&mut self, task: Task) -> Result<(), QueueError> {
        let due = task.due();
        let slot = self.tasks.insert(task);
        if let Err(e) = self.queue.push(Entry { due, slot }) {
            self.tasks.remove(slot);
            return Err(e);
        }
        Ok(())
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("len", &self.queue.len())
            .field("stored", &self.tasks.len())
            .field("running", &self.running.is_running())
            .finish()
    }
}

/// Sleeps until `due`, going back to sleep if woken early.
async fn wait_until(due: Instant) {
    while Instant::now() < due {
        time::sleep_until(due).await;
    }
}
