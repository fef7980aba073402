//! # Mutual supervision of a process pair.
//!
//! A guarded application and its guardian heartbeat each other (`SIGUSR1`) and each
//! relaunches the other once it has been silent for longer than
//! [`Config::max_missed`](crate::Config::max_missed) ticks. The application ends the
//! pair with [`let_me_die`], which sends the guardian `SIGUSR2`.
//!
//! ```text
//!   guarded app                                  guardian
//!   ───────────                                  ────────
//!   keep_alive(argv) ── spawn (marker unset) ──► pairvisor-guardian argv...
//!        ▲      ◄──────────── SIGUSR1 every 1s ───────────── │
//!        │      ──────────── SIGUSR1 every 1s ─────────────► │
//!        └─────────── relaunch argv[0] when app is stale ────┘
//!   let_me_die() ─────────────── SIGUSR2 ──────────────────► exits
//! ```
//!
//! - [`Watchdog`]: the shared state machine, generic over [`PeerLink`].
//! - [`keep_alive`] / [`let_me_die`]: the application-facing calls.
//! - [`run_guardian`]: the guardian binary's entry point.

mod context;
mod control;
mod guarded;
mod guardian;
mod link;
mod liveness;
mod marker;
mod protocol;

#[cfg(test)]
mod testing;

pub use context::ProtocolTasks;
pub use control::{Control, Inbox, Role};
pub use guarded::{keep_alive, keep_alive_with, let_me_die};
pub use guardian::run_guardian;
pub use link::{OsLink, PeerCommand, PeerLink, PeerSignal, Pid};
pub use liveness::Liveness;
pub use marker::LivenessMarker;
pub use protocol::Watchdog;
