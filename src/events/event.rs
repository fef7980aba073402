//! # Runtime events emitted by the scheduler and the watchdog.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Scheduler events**: task bookkeeping and failures
//! - **Protocol events**: heartbeats, staleness, revival, shutdown
//! - **Subscriber events**: fan-out plumbing (overflow, panics)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task name,
//! peer pid and a reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use pairvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ReviveFailed)
//!     .with_peer(4242)
//!     .with_reason("fork: resource temporarily unavailable");
//!
//! assert_eq!(ev.kind, EventKind::ReviveFailed);
//! assert_eq!(ev.peer, Some(4242));
//! assert_eq!(ev.reason.as_deref(), Some("fork: resource temporarily unavailable"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Scheduler events ===
    /// A task was enqueued.
    ///
    /// Sets:
    /// - `task`: callback name
    TaskAdded,

    /// Enqueueing a new task failed; the caller received the bad id.
    ///
    /// Sets:
    /// - `task`: callback name
    /// - `reason`: queue error
    TaskAddFailed,

    /// A task was removed by id.
    ///
    /// Sets:
    /// - `task`: callback name
    TaskRemoved,

    /// A callback returned `Fail`; the task was discarded and the loop goes on.
    ///
    /// Sets:
    /// - `task`: callback name
    TaskFailed,

    /// A `Repeat` task could not be re-enqueued and was discarded.
    ///
    /// Sets:
    /// - `task`: callback name
    /// - `reason`: queue error
    TaskRequeueFailed,

    /// `Scheduler::run` returned because its running flag was cleared.
    SchedulerStopped,

    // === Protocol events ===
    /// The heartbeat signal was delivered to the peer.
    ///
    /// Sets:
    /// - `peer`: target pid
    HeartbeatSent,

    /// Sending the heartbeat signal to the peer failed (peer likely gone).
    ///
    /// Sets:
    /// - `peer`: target pid
    /// - `reason`: OS error
    HeartbeatSendFailed,

    /// No heartbeat for longer than the threshold; revival is due.
    ///
    /// Sets:
    /// - `peer`: pid believed dead
    /// - `stale_ticks`: counter value that crossed the threshold
    PeerStale,

    /// The guarded process started a new guardian during bootstrap.
    ///
    /// Sets:
    /// - `peer`: guardian pid
    GuardianSpawned,

    /// The guarded process found an existing guardian (its parent).
    ///
    /// Sets:
    /// - `peer`: guardian pid
    GuardianAdopted,

    /// A revival spawn is about to start.
    ///
    /// Sets:
    /// - `peer`: pid believed dead
    ReviveStarted,

    /// A revival spawn failed; it will be retried on the next staleness cycle.
    ///
    /// Sets:
    /// - `reason`: OS error
    ReviveFailed,

    /// The peer sent its first heartbeat after being spawned.
    ///
    /// Sets:
    /// - `peer`: new peer pid
    PeerReady,

    /// Graceful shutdown was requested (local call or shutdown signal).
    ShutdownRequested,

    /// The shutdown signal was delivered to the peer.
    ///
    /// Sets:
    /// - `peer`: target pid
    /// - `reason`: OS error, if delivery failed
    ShutdownSent,

    /// The main loop exited; no more supervision from this process.
    SupervisionEnded,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the task (or subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Peer process id, if applicable.
    pub peer: Option<i32>,
    /// Staleness counter value, if applicable.
    pub stale_ticks: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            peer: None,
            stale_ticks: None,
            reason: None,
        }
    }

    /// Attaches a task (or subscriber) name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a peer pid.
    #[inline]
    pub fn with_peer(mut self, pid: i32) -> Self {
        self.peer = Some(pid);
        self
    }

    /// Attaches the staleness counter value.
    #[inline]
    pub fn with_stale_ticks(mut self, ticks: u64) -> Self {
        self.stale_ticks = Some(ticks);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
