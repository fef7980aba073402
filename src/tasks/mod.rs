//! # Task abstractions.
//!
//! This module provides the task-related types:
//! - [`Uid`] - process-unique identifier, with an all-zero "bad" sentinel
//! - [`TaskOutcome`] - `Done` / `Repeat` / `Fail` result of one execution
//! - [`Callback`] - trait for the work a task performs
//! - [`TaskFn`] - closure-backed [`Callback`]
//! - [`Task`] - scheduled unit (id, due time, interval, callback)

mod callback;
mod outcome;
mod task;
mod task_fn;
mod uid;

pub use callback::Callback;
pub use outcome::TaskOutcome;
pub use task::Task;
pub use task_fn::TaskFn;
pub use uid::Uid;
