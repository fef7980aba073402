//! # Callback abstraction for scheduled work.
//!
//! A [`Callback`] has a stable [`name`](Callback::name) and a synchronous
//! [`call`](Callback::call) that reports a [`TaskOutcome`]. Callbacks run on the
//! scheduler's thread between due-time waits, so they should be short; anything that
//! blocks delays every other task.

use crate::tasks::outcome::TaskOutcome;

/// # Unit of work executed by the scheduler.
///
/// # Example
/// ```
/// use pairvisor::{Callback, TaskOutcome};
///
/// struct Countdown(u32);
///
/// impl Callback for Countdown {
///     fn name(&self) -> &str { "countdown" }
///
///     fn call(&mut self) -> TaskOutcome {
///         if self.0 == 0 {
///             return TaskOutcome::Done;
///         }
///         self.0 -= 1;
///         TaskOutcome::Repeat
///     }
/// }
/// ```
pub trait Callback: Send + 'static {
    /// Returns a stable, human-readable name (for events and logs).
    fn name(&self) -> &str;

    /// Executes the work once.
    fn call(&mut self) -> TaskOutcome;
}

impl<C: Callback + ?Sized> Callback for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn call(&mut self) -> TaskOutcome {
        (**self).call()
    }
}
