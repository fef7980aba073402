//! # Process-unique task identifiers.
//!
//! A [`Uid`] combines wall-clock seconds, the calling process id, and a
//! process-wide counter that is bumped atomically on every [`Uid::new`] call.
//!
//! ## Rules
//! - Two `Uid`s created in the same process are never equal (the counter strictly
//!   increases, whatever thread calls).
//! - Across processes equality would need identical time, pid and counter at once;
//!   treated as practically impossible, not cryptographically guaranteed.
//! - The all-zero value is the **bad** sentinel returned when a task could not be
//!   scheduled. The counter starts at 1, so a generated `Uid` is never bad.
//! - There is no `Default`; every fresh id comes from an explicit [`Uid::new`]:
//!
//! ```compile_fail
//! let _ = pairvisor::Uid::default();
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Process-wide counter shared by every thread.
static UID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifier used to address a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Uid {
    wall_time: u64,
    pid: u32,
    counter: u64,
}

#[allow(clippy::new_without_default)]
impl Uid {
    /// Generates a fresh identifier. Thread-safe.
    pub fn new() -> Self {
        let wall_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Self {
            wall_time,
            pid: std::process::id(),
            counter: UID_COUNTER.fetch_add(1, Ordering::Relaxed) + 1,
        }
    }

    /// Returns the all-zero sentinel.
    #[inline]
    pub const fn bad() -> Self {
        Self {
            wall_time: 0,
            pid: 0,
            counter: 0,
        }
    }

    /// True iff every field is zero.
    #[inline]
    pub fn is_bad(&self) -> bool {
        self.wall_time == 0 && self.pid == 0 && self.counter == 0
    }

    /// Field-wise equality; same as `==`.
    #[inline]
    pub fn is_same(&self, other: &Uid) -> bool {
        self == other
    }

    /// Seconds since the Unix epoch at creation.
    pub fn wall_time(&self) -> u64 {
        self.wall_time
    }

    /// Id of the process that created this identifier.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Position in the process-wide sequence.
    pub fn counter(&self) -> u64 {
        self.counter
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.wall_time, self.pid, self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_bad_is_bad() {
        assert!(Uid::bad().is_bad());
        assert!(Uid::bad().is_same(&Uid::bad()));
    }

    #[test]
    fn test_generated_is_never_bad() {
        for _ in 0..100 {
            assert!(!Uid::new().is_bad());
        }
    }

    #[test]
    fn test_generated_differ() {
        let a = Uid::new();
        let b = Uid::new();
        assert!(!a.is_same(&b));
        assert!(a.is_same(&a));
        assert!(b.counter() > a.counter());
        assert_eq!(a.pid(), std::process::id());
    }

    #[test]
    fn test_unique_across_threads() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 2_000;

        let all: Vec<Uid> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| s.spawn(|| (0..PER_THREAD).map(|_| Uid::new()).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().expect("uid thread panicked"))
                .collect()
        });

        let distinct: HashSet<Uid> = all.iter().copied().collect();
        assert_eq!(distinct.len(), THREADS * PER_THREAD);
    }

    #[test]
    fn test_display() {
        assert_eq!(Uid::bad().to_string(), "0-0-0");
    }
}
