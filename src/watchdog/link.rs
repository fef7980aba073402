//! # Process boundary: spawning and signalling the peer.
//!
//! Everything the protocol does to another process goes through [`PeerLink`]:
//! spawning it, sending it one of the two [`PeerSignal`]s, finding the parent pid,
//! and installing the listeners that feed incoming signals into an [`Inbox`].
//! [`OsLink`] is the real implementation; tests substitute a fake.
//!
//! ```text
//! PeerSignal::Heartbeat ──► SIGUSR1 ──► peer Inbox::heartbeat() ──► Liveness::beat()
//! PeerSignal::Shutdown  ──► SIGUSR2 ──► peer Inbox::shutdown()  ──► Control::request_shutdown()
//! ```

use std::ffi::OsString;
use std::io;

use tokio::signal::unix::{Signal, SignalKind, signal};

use crate::watchdog::control::{Inbox, Role};

/// OS process id.
pub type Pid = i32;

/// The two messages a pair exchanges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerSignal {
    /// "I am alive" (`SIGUSR1`).
    Heartbeat,
    /// "Stop supervising and exit" (`SIGUSR2`).
    Shutdown,
}

impl PeerSignal {
    pub fn signo(&self) -> libc::c_int {
        match self {
            PeerSignal::Heartbeat => libc::SIGUSR1,
            PeerSignal::Shutdown => libc::SIGUSR2,
        }
    }
}

/// How to launch the peer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeerCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
    /// Added to the inherited environment.
    pub env: Vec<(OsString, OsString)>,
}

/// Spawn-and-signal capability used by the protocol.
pub trait PeerLink: Send + Sync + 'static {
    /// Starts the peer and returns its pid.
    ///
    /// A program that cannot be executed is reported here as an error.
    fn spawn(&self, cmd: &PeerCommand) -> io::Result<Pid>;

    /// Delivers `signal` to `pid`.
    fn send(&self, pid: Pid, signal: PeerSignal) -> io::Result<()>;

    /// Pid of this process's parent.
    fn parent(&self) -> Pid;

    /// Installs the listeners for `role` and forwards signals into `inbox`.
    ///
    /// Both roles listen for heartbeats; only the guardian listens for shutdown.
    /// Must be called from inside a tokio runtime.
    fn listen(&self, role: Role, inbox: Inbox) -> io::Result<()>;
}

/// [`PeerLink`] over real processes and POSIX signals.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsLink;

impl OsLink {
    pub fn new() -> Self {
        Self
    }
}

impl PeerLink for OsLink {
    fn spawn(&self, cmd: &PeerCommand) -> io::Result<Pid> {
        // The runtime reaps the child once the handle is dropped.
        let child = tokio::process::Command::new(&cmd.program)
            .args(&cmd.args)
            .envs(cmd.env.iter().map(|(k, v)| (k, v)))
            .spawn()?;

        let id = child
            .id()
            .ok_or_else(|| io::Error::other("peer exited before its pid was read"))?;
        Pid::try_from(id).map_err(io::Error::other)
    }

    fn send(&self, pid: Pid, signal: PeerSignal) -> io::Result<()> {
        if pid <= 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to signal pid {pid}"),
            ));
        }
        // SAFETY: kill(2) takes plain integers; pid > 0 addresses a single process.
        let rc = unsafe { libc::kill(pid, signal.signo()) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    fn parent(&self) -> Pid {
        Pid::try_from(std::os::unix::process::parent_id()).unwrap_or(1)
    }

    fn listen(&self, role: Role, inbox: Inbox) -> io::Result<()> {
        let mut heartbeat = signal(SignalKind::user_defined1())?;
        let mut shutdown = match role {
            Role::Guardian => Some(signal(SignalKind::user_defined2())?),
            Role::Guarded => None,
        };

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    got = heartbeat.recv() => match got {
                        Some(()) => inbox.heartbeat(),
                        None => break,
                    },
                    got = recv_optional(&mut shutdown) => match got {
                        Some(()) => inbox.shutdown(),
                        None => break,
                    },
                }
            }
        });
        Ok(())
    }
}

async fn recv_optional(sig: &mut Option<Signal>) -> Option<()> {
    match sig {
        Some(sig) => sig.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_numbers() {
        assert_eq!(PeerSignal::Heartbeat.signo(), libc::SIGUSR1);
        assert_eq!(PeerSignal::Shutdown.signo(), libc::SIGUSR2);
    }

    #[test]
    fn test_refuses_group_signals() {
        let err = OsLink::new().send(0, PeerSignal::Heartbeat).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(OsLink::new().send(-1, PeerSignal::Shutdown).is_err());
    }

    #[test]
    fn test_parent_is_positive() {
        assert!(OsLink::new().parent() > 0);
    }

    #[tokio::test]
    async fn test_spawn_missing_program_fails() {
        let cmd = PeerCommand {
            program: OsString::from("/nonexistent/pairvisor-peer"),
            ..PeerCommand::default()
        };
        assert!(OsLink::new().spawn(&cmd).is_err());
    }
}
