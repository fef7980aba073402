//! # Shutdown control and the signal inbox.
//!
//! [`Control`] ends supervision: it cancels the shutdown token (which also ends an
//! unbounded peer-ready wait) and clears the scheduler's running flag.
//! [`Inbox`] is what a [`PeerLink`](super::PeerLink) delivers incoming signals to.

use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::scheduler::StopHandle;
use crate::watchdog::liveness::Liveness;

/// Which side of the pair this process is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// The supervised application.
    Guarded,
    /// The watchdog process.
    Guardian,
}

impl Role {
    pub fn as_label(&self) -> &'static str {
        match self {
            Role::Guarded => "guarded",
            Role::Guardian => "guardian",
        }
    }
}

/// Cloneable graceful-shutdown handle for one supervision loop.
#[derive(Clone, Debug)]
pub struct Control {
    shutdown: CancellationToken,
    stop: StopHandle,
    bus: Bus,
}

impl Control {
    pub(crate) fn new(stop: StopHandle, bus: Bus) -> Self {
        Self {
            shutdown: CancellationToken::new(),
            stop,
            bus,
        }
    }

    /// Requests graceful shutdown. Idempotent; never blocks.
    pub fn request_shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            self.bus.publish(Event::new(EventKind::ShutdownRequested));
        }
        self.shutdown.cancel();
        self.stop.stop();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Completes once shutdown has been requested.
    pub async fn cancelled(&self) {
        self.shutdown.cancelled().await
    }
}

/// Receiver side of the two peer signals.
#[derive(Clone, Debug)]
pub struct Inbox {
    liveness: Liveness,
    control: Control,
}

impl Inbox {
    pub(crate) fn new(liveness: Liveness, control: Control) -> Self {
        Self { liveness, control }
    }

    /// The peer says it is alive.
    pub fn heartbeat(&self) {
        self.liveness.beat();
    }

    /// The peer asks this process to stop supervising.
    pub fn shutdown(&self) {
        self.control.request_shutdown();
    }
}
