//! Time-ordered task scheduler.
//!
//! The only public types from this module are [`Scheduler`], [`StopHandle`],
//! [`Spawner`] and [`RunOutcome`].
//!
//! Internal modules:
//! - `arena`: slot storage that owns queued tasks; the heap holds slot indices;
//! - `stop`: the shared running flag, safe to clear from any context;
//! - `spawner`: pending list for tasks added from inside callbacks;
//! - `engine`: the scheduler itself and its run loop.
//!
//! ## Run loop
//! ```text
//! run():
//!   running = true, admit spawned tasks
//!   while queue non-empty && running {
//!     ├─► peek earliest entry
//!     ├─► sleep until its due time (re-sleep on early wakeups)
//!     ├─► pop entry, take task out of the arena
//!     ├─► call callback, then admit the tasks it spawned
//!     │     ├─ Done   ─► drop task
//!     │     ├─ Fail   ─► publish TaskFailed, drop task
//!     │     └─ Repeat ─► due = now + interval, re-enqueue
//!     │                  (on failure: publish TaskRequeueFailed, drop task;
//!     │                   reachable when spawned tasks filled the capacity limit)
//!     └─► loop condition re-checks `running` (a callback may have cleared it)
//!   }
//!   return running ? Complete : Stopped
//! ```

mod arena;
mod engine;
mod spawner;
mod stop;

pub use engine::{RunOutcome, Scheduler};
pub use spawner::Spawner;
pub use stop::StopHandle;
