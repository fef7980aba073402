//! Error types used by the pairvisor queue, scheduler and watchdog.
//!
//! This module defines three error enums:
//!
//! - [`QueueError`] — the priority queue refused an insertion.
//! - [`SchedulerError`] — a scheduler operation could not be carried out.
//! - [`WatchdogError`] — the supervision protocol failed to bootstrap.
//!
//! Each type provides [`as_label`](WatchdogError::as_label) for logs/metrics.
//!
//! Peer failure (crash, hang, missed heartbeats) is **not** an error here: it is the
//! designed-for case and is handled by revival. Task `Fail` outcomes are reported as
//! events, not errors.

use std::ffi::OsString;
use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::tasks::Uid;

/// # Errors produced by the priority queue.
///
/// Both variants mean "resource exhaustion": the item was not inserted and
/// ownership stays with the caller.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The configured capacity limit has been reached.
    #[error("queue is full (limit {limit})")]
    Full {
        /// The configured maximum number of items.
        limit: usize,
    },

    /// Growing the backing storage failed.
    #[error("queue allocation failed")]
    Alloc,
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::Full { .. } => "queue_full",
            QueueError::Alloc => "queue_alloc",
        }
    }
}

/// # Errors produced by the scheduler.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// No queued task carries the given identifier.
    #[error("no task with id {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: Uid,
    },

    /// The task could not be enqueued.
    #[error("cannot enqueue task: {0}")]
    Queue(#[from] QueueError),
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pairvisor::{SchedulerError, Uid};
    ///
    /// let err = SchedulerError::NotFound { id: Uid::bad() };
    /// assert_eq!(err.as_label(), "scheduler_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::NotFound { .. } => "scheduler_not_found",
            SchedulerError::Queue(_) => "scheduler_queue",
        }
    }
}

/// # Errors produced by the supervision protocol.
///
/// Only bootstrap can fail from the embedding application's point of view;
/// once the main loop runs, every failure is handled by revival or reported
/// as an event.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WatchdogError {
    /// Spawning the peer process failed (fork or exec).
    #[error("failed to spawn peer {program:?}: {source}")]
    Spawn {
        /// Program that could not be started.
        program: OsString,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Installing the heartbeat/shutdown signal listeners failed.
    #[error("failed to install signal listeners: {0}")]
    Listen(#[source] io::Error),

    /// No heartbeat from the peer arrived within the bootstrap timeout.
    #[error("peer did not send a heartbeat within {timeout:?}")]
    BootstrapTimeout {
        /// The bounded wait that expired.
        timeout: Duration,
    },

    /// Supervision is already active in this process.
    #[error("supervision is already active in this process")]
    AlreadyRunning,

    /// The argument vector is empty, so there is nothing to revive.
    #[error("argument vector is empty; cannot tell which program to revive")]
    MissingProgram,

    /// The dedicated supervision thread could not be started.
    #[error("failed to start supervision thread: {0}")]
    Thread(#[source] io::Error),

    /// The supervision thread's async runtime could not be built.
    #[error("failed to build async runtime: {0}")]
    Runtime(#[source] io::Error),

    /// The supervision thread ended before reporting bootstrap status.
    #[error("supervision thread exited before bootstrap completed")]
    Disconnected,
}

impl WatchdogError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pairvisor::WatchdogError;
    /// use std::time::Duration;
    ///
    /// let err = WatchdogError::BootstrapTimeout { timeout: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "watchdog_bootstrap_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WatchdogError::Spawn { .. } => "watchdog_spawn",
            WatchdogError::Listen(_) => "watchdog_listen",
            WatchdogError::BootstrapTimeout { .. } => "watchdog_bootstrap_timeout",
            WatchdogError::AlreadyRunning => "watchdog_already_running",
            WatchdogError::MissingProgram => "watchdog_missing_program",
            WatchdogError::Thread(_) => "watchdog_thread",
            WatchdogError::Runtime(_) => "watchdog_runtime",
            WatchdogError::Disconnected => "watchdog_disconnected",
        }
    }

    /// Indicates whether supervision may still be running in the background.
    ///
    /// A bootstrap timeout is reported to the caller, but the supervision thread
    /// keeps going and will pick up the peer once it reports.
    pub fn is_detached(&self) -> bool {
        matches!(self, WatchdogError::BootstrapTimeout { .. })
    }
}
