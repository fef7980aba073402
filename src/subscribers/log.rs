//! # LogWriter: events as `tracing` records.
//!
//! Maps every [`Event`] to one `tracing` record with structured fields. Routine
//! bookkeeping is `debug`, protocol milestones are `info`, anything that means a peer
//! or a task misbehaved is `warn`.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO pairvisor: guardian spawned peer=41210
//! WARN pairvisor: peer stale, reviving peer=41210 stale_ticks=4
//! INFO pairvisor: revive started peer=41210
//! INFO pairvisor: peer ready peer=41388
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "pairvisor";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        let peer = e.peer.unwrap_or_default();

        match e.kind {
            EventKind::TaskAdded => debug!(target: TARGET, task, "task added"),
            EventKind::TaskRemoved => debug!(target: TARGET, task, "task removed"),
            EventKind::TaskAddFailed => warn!(target: TARGET, task, reason, "task add failed"),
            EventKind::TaskFailed => warn!(target: TARGET, task, "task failed"),
            EventKind::TaskRequeueFailed => {
                warn!(target: TARGET, task, reason, "task requeue failed, dropped")
            }
            EventKind::SchedulerStopped => debug!(target: TARGET, "scheduler stopped"),
            EventKind::HeartbeatSent => debug!(target: TARGET, peer, "heartbeat sent"),
            EventKind::HeartbeatSendFailed => {
                debug!(target: TARGET, peer, reason, "heartbeat send failed")
            }
            EventKind::PeerStale => warn!(
                target: TARGET,
                peer,
                stale_ticks = e.stale_ticks.unwrap_or_default(),
                "peer stale, reviving"
            ),
            EventKind::GuardianSpawned => info!(target: TARGET, peer, "guardian spawned"),
            EventKind::GuardianAdopted => info!(target: TARGET, peer, "guardian adopted"),
            EventKind::ReviveStarted => info!(target: TARGET, peer, "revive started"),
            EventKind::ReviveFailed => warn!(target: TARGET, reason, "revive failed"),
            EventKind::PeerReady => info!(target: TARGET, peer, "peer ready"),
            EventKind::ShutdownRequested => info!(target: TARGET, "shutdown requested"),
            EventKind::ShutdownSent => info!(target: TARGET, peer, reason, "shutdown sent"),
            EventKind::SupervisionEnded => info!(target: TARGET, "supervision ended"),
            EventKind::SubscriberOverflow => {
                warn!(target: TARGET, subscriber = task, reason, "subscriber dropped event")
            }
            EventKind::SubscriberPanicked => {
                warn!(target: TARGET, subscriber = task, reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }

    fn queue_capacity(&self) -> usize {
        256
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock().unwrap())
                .lines()
                .map(str::to_owned)
                .collect()
        }
    }

    #[tokio::test]
    async fn test_records_level_and_fields() {
        let out = Capture::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let w = LogWriter::new();
        assert_eq!(w.name(), "LogWriter");
        assert_eq!(w.queue_capacity(), 256);

        w.on_event(&Event::new(EventKind::PeerStale).with_peer(7).with_stale_ticks(4))
            .await;
        w.on_event(&Event::new(EventKind::HeartbeatSent).with_peer(7))
            .await;
        w.on_event(&Event::subscriber_overflow("other", "full")).await;

        let lines = out.lines();
        assert_eq!(lines.len(), 3, "{lines:?}");

        assert!(lines[0].contains("WARN"), "{}", lines[0]);
        assert!(lines[0].contains("pairvisor: peer stale, reviving"));
        assert!(lines[0].contains("peer=7"));
        assert!(lines[0].contains("stale_ticks=4"));

        assert!(lines[1].contains("DEBUG"), "{}", lines[1]);
        assert!(lines[1].contains("heartbeat sent"));

        assert!(lines[2].contains("WARN"), "{}", lines[2]);
        assert!(lines[2].contains("subscriber dropped event"));
        assert!(lines[2].contains("subscriber=") && lines[2].contains("other"));
        assert!(lines[2].contains("reason=") && lines[2].contains("full"));
    }
}
