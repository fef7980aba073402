/// What the scheduler should do with a task after its callback returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Finished; discard the task.
    Done,
    /// Run again `interval` after this execution completed.
    Repeat,
    /// Failed; report it and discard the task. Never stops the run loop.
    Fail,
}

impl TaskOutcome {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskOutcome::Done => "done",
            TaskOutcome::Repeat => "repeat",
            TaskOutcome::Fail => "fail",
        }
    }
}
