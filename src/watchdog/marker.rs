//! # Liveness marker: "a guardian for this lineage already exists".
//!
//! The marker is an environment variable inherited by every process the pair
//! spawns. In the process that claims it, it is also recorded in memory, since the
//! process environment is not modified at runtime.
//!
//! Check-then-set is not atomic across processes: two guarded processes started at
//! the same moment with no marker may both spawn a guardian.

use std::ffi::{OsStr, OsString};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Inherited flag that prevents spawning a second guardian.
#[derive(Clone, Debug)]
pub struct LivenessMarker {
    var: String,
    claimed: Arc<AtomicBool>,
}

impl LivenessMarker {
    /// Marker with its own in-memory claim.
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            claimed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Marker whose in-memory claim is shared by the whole process.
    pub fn for_process(var: impl Into<String>) -> Self {
        static CLAIMED: OnceLock<Arc<AtomicBool>> = OnceLock::new();
        Self {
            var: var.into(),
            claimed: Arc::clone(CLAIMED.get_or_init(Arc::default)),
        }
    }

    /// True if this process claimed the marker or inherited it.
    pub fn is_set(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
            || std::env::var_os(&self.var).is_some_and(|v| !v.is_empty())
    }

    pub fn set(&self) {
        self.claimed.store(true, Ordering::Release);
    }

    /// Drops this process's claim. An inherited marker stays visible.
    pub fn clear(&self) {
        self.claimed.store(false, Ordering::Release);
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    /// Environment entry that passes the marker on to a child.
    pub fn env_entry(&self) -> (OsString, OsString) {
        (OsString::from(&self.var), OsStr::new("1").to_os_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_and_clear() {
        let m = LivenessMarker::new("PAIRVISOR_TEST_MARKER_NEVER_EXPORTED");
        assert!(!m.is_set());
        m.set();
        assert!(m.is_set());
        assert!(m.clone().is_set());
        m.clear();
        assert!(!m.is_set());
    }

    #[test]
    fn test_inherited_marker_is_seen() {
        // PATH is always present in the test environment.
        let m = LivenessMarker::new("PATH");
        assert!(m.is_set());
        m.clear();
        assert!(m.is_set());
    }

    #[test]
    fn test_env_entry() {
        let m = LivenessMarker::new("X_ALIVE");
        assert_eq!(m.env_entry(), (OsString::from("X_ALIVE"), OsString::from("1")));
    }
}
