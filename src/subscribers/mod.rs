//! # Event subscribers.
//!
//! Subscribers observe the [`Event`](crate::Event)s that the scheduler and the
//! watchdog publish on the [`Bus`](crate::Bus). They never influence supervision: a
//! slow, failing or panicking subscriber only loses its own events.
//!
//! ## Architecture
//! ```text
//! Scheduler ─┐
//!            ├─ publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//! Watchdog  ─┘                                             │
//!                                                          ├──► [queue] ──► LogWriter
//!                                                          └──► [queue] ──► custom ...
//! ```
//!
//! - [`Subscribe`]: the extension trait.
//! - [`SubscriberSet`]: per-subscriber queues and workers.
//! - [`LogWriter`]: forwards events to `tracing` (feature `logging`).

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
