//! # pairvisor
//!
//! **Pairvisor** keeps a process alive by pairing it with a guardian process. The
//! two heartbeat each other over POSIX signals and each one relaunches the other
//! when it goes silent, so a crash, a hang or a `kill -9` of either side is
//! repaired without an external orchestrator.
//!
//! Underneath the protocol sits a small time-ordered [`Scheduler`] that both
//! processes run identically; it is usable on its own.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  guarded application                               guardian process
//! ┌─────────────────────────────────┐              ┌─────────────────────────────────┐
//! │ main thread                     │              │ pairvisor-guardian <app argv>   │
//! │   keep_alive(argv) / let_me_die │              │   run_guardian(argv)            │
//! │            │                    │              │            │                    │
//! │ supervision thread              │   SIGUSR1    │            ▼                    │
//! │   Watchdog(Guarded)  ◄──────────┼──────────────┼──  Watchdog(Guardian)           │
//! │     Scheduler ──────────────────┼──────────────┼─►    Scheduler                  │
//! │       send-heartbeat  (1s)      │   SIGUSR1    │        send-heartbeat  (1s)     │
//! │       check-staleness (2s)      │              │        check-staleness (2s)     │
//! │       tick-counter    (1s)      │   SIGUSR2    │        tick-counter    (1s)     │
//! │     let_me_die ─────────────────┼──────────────┼─►    exit                       │
//! └─────────────────────────────────┘              └─────────────────────────────────┘
//!         ▲   relaunch argv[0] when the app is stale        │
//!         └─────────────────────────────────────────────────┘
//! ```
//!
//! ### Supervision loop (both roles)
//! ```text
//! bootstrap ──► loop {
//!   ├─► Scheduler::run()
//!   │      ├─ Stopped by check-staleness ─► revive: spawn peer, await first heartbeat
//!   │      └─ shutdown requested          ─► exit loop
//! }
//! finish: guarded side sends SIGUSR2 to the guardian
//! ```
//!
//! ### Events
//! ```text
//! Scheduler / Watchdog ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                  ├─► LogWriter
//!                                                                  └─► custom Subscribe
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types / functions                          |
//! |-----------------|----------------------------------------------------------|------------------------------------------------|
//! | **Protocol**    | Mutual supervision of an application and its guardian.   | [`keep_alive`], [`let_me_die`], [`run_guardian`], [`Watchdog`] |
//! | **Scheduling**  | Due-time ordered tasks with Done/Repeat/Fail outcomes.   | [`Scheduler`], [`Spawner`], [`TaskFn`]         |
//! | **Identity**    | Process-unique task ids with a "bad" sentinel.           | [`Uid`]                                        |
//! | **Events**      | Observe scheduler and protocol transitions.              | [`Event`], [`EventKind`], [`Subscribe`]        |
//! | **Errors**      | Typed errors with stable labels.                         | [`SchedulerError`], [`WatchdogError`]          |
//! | **Configuration** | Cadence, thresholds, guardian path.                    | [`Config`]                                     |
//!
//! ## Optional features
//! - `logging` (default): [`LogWriter`] and [`init_tracing`], and the two binaries.
//!
//! ## Example
//! ```no_run
//! use std::time::Duration;
//!
//! fn main() -> Result<(), pairvisor::WatchdogError> {
//!     pairvisor::keep_alive(std::env::args_os())?;
//!
//!     // ... work while being watched ...
//!     std::thread::sleep(Duration::from_secs(30));
//!
//!     pairvisor::let_me_die();
//!     Ok(())
//! }
//! ```
mod config;
mod error;
mod events;
mod queue;
mod scheduler;
mod subscribers;
mod tasks;
mod watchdog;

#[cfg(feature = "logging")]
mod logging;

// ---- Public re-exports ----

pub use config::{Config, GUARDIAN_BIN};
pub use error::{QueueError, SchedulerError, WatchdogError};
pub use events::{Bus, Event, EventKind};
pub use queue::PriorityQueue;
pub use scheduler::{RunOutcome, Scheduler, Spawner, StopHandle};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Callback, Task, TaskFn, TaskOutcome, Uid};
pub use watchdog::{
    Control, Inbox, Liveness, LivenessMarker, OsLink, PeerCommand, PeerLink, PeerSignal, Pid,
    ProtocolTasks, Role, Watchdog, keep_alive, keep_alive_with, let_me_die, run_guardian,
};

// Optional: tracing-backed subscriber and subscriber setup.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use logging::init_tracing;
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
