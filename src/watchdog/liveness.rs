//! # Staleness counter and heartbeat generation.
//!
//! [`Liveness`] is the only state shared between the heartbeat listener and the
//! supervision loop:
//!
//! ```text
//! heartbeat listener ── beat() ──► stale = 0, generation += 1, wake waiters
//! tick-counter task  ── tick() ──► stale += 1
//! check-staleness    ── stale_ticks() > max_missed ? ──► reset(), stop scheduler
//! await peer ready   ── wait_since(seen) ──► returns once generation > seen
//! ```
//!
//! Heartbeats are not counted: only "at least one arrived since `seen`" is
//! observable, so the staleness counter is the sole source of truth.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    stale: AtomicU64,
    generation: AtomicU64,
    notify: Notify,
}

/// Cloneable handle over one process's liveness state.
#[derive(Clone, Debug, Default)]
pub struct Liveness {
    inner: Arc<Inner>,
}

impl Liveness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a heartbeat from the peer.
    pub fn beat(&self) {
        self.inner.stale.store(0, Ordering::Release);
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.notify.notify_waiters();
    }

    /// Advances the staleness counter by one tick; returns the new value.
    pub fn tick(&self) -> u64 {
        self.inner.stale.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Ticks elapsed since the last heartbeat (or reset).
    pub fn stale_ticks(&self) -> u64 {
        self.inner.stale.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.inner.stale.store(0, Ordering::Release);
    }

    /// Number of heartbeats observed so far.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Waits until a heartbeat newer than generation `seen` has been observed.
    ///
    /// Sample `seen` with [`generation`](Self::generation) *before* doing whatever
    /// should provoke the heartbeat; one that arrives in between is not lost.
    pub async fn wait_since(&self, seen: u64) -> u64 {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let current = self.generation();
            if current > seen {
                return current;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_beat_resets_counter() {
        let l = Liveness::new();
        assert_eq!(l.tick(), 1);
        assert_eq!(l.tick(), 2);
        l.beat();
        assert_eq!(l.stale_ticks(), 0);
        assert_eq!(l.generation(), 1);
    }

    #[tokio::test]
    async fn test_wait_since_sees_earlier_beat() {
        let l = Liveness::new();
        let seen = l.generation();
        l.beat();
        assert_eq!(l.wait_since(seen).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_since_wakes_on_later_beat() {
        let l = Liveness::new();
        let beater = l.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            beater.beat();
        });

        let got = tokio::time::timeout(Duration::from_secs(10), l.wait_since(0)).await;
        assert_eq!(got, Ok(1));
    }
}
