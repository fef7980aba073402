//! # Function-backed callback (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: FnMut() -> TaskOutcome` together with a name.
//! Whatever data the callback works on is captured by the closure; the scheduler
//! never looks at it.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use pairvisor::{Callback, TaskFn, TaskOutcome};
//!
//! let hits = Arc::new(AtomicU32::new(0));
//! let counter = Arc::clone(&hits);
//! let mut cb = TaskFn::new("count", move || {
//!     counter.fetch_add(1, Ordering::Relaxed);
//!     TaskOutcome::Repeat
//! });
//!
//! assert_eq!(cb.name(), "count");
//! assert_eq!(cb.call(), TaskOutcome::Repeat);
//! assert_eq!(hits.load(Ordering::Relaxed), 1);
//! ```

use std::borrow::Cow;

use crate::tasks::callback::Callback;
use crate::tasks::outcome::TaskOutcome;

/// Function-backed callback implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed callback.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Callback for TaskFn<F>
where
    F: FnMut() -> TaskOutcome + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&mut self) -> TaskOutcome {
        (self.f)()
    }
}
