//! Per-process communication context: who the peer is and how to bring it back.

use std::ffi::OsString;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::config::Config;
use crate::tasks::Uid;
use crate::watchdog::control::Role;
use crate::watchdog::link::{PeerCommand, Pid};
use crate::watchdog::marker::LivenessMarker;

/// Current peer pid, shared with the heartbeat task. Replaced on every revival.
#[derive(Clone, Debug, Default)]
pub(crate) struct PeerPid(Arc<AtomicI32>);

impl PeerPid {
    pub(crate) fn get(&self) -> Pid {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn set(&self, pid: Pid) {
        self.0.store(pid, Ordering::Release);
    }
}

/// Ids of the three protocol tasks.
#[derive(Clone, Copy, Debug)]
pub struct ProtocolTasks {
    pub heartbeat: Uid,
    pub check: Uid,
    pub tick: Uid,
}

impl ProtocolTasks {
    pub(crate) fn unset() -> Self {
        Self {
            heartbeat: Uid::bad(),
            check: Uid::bad(),
            tick: Uid::bad(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct CommContext {
    pub(crate) argv: Vec<OsString>,
    pub(crate) revive: PeerCommand,
    pub(crate) peer: PeerPid,
    pub(crate) tasks: ProtocolTasks,
}

impl CommContext {
    /// `argv` must be non-empty.
    ///
    /// The guarded side launches the configured guardian with its own argv as the
    /// guardian's arguments; the guardian relaunches `argv[0]` with `argv[1..]`.
    pub(crate) fn new(
        role: Role,
        argv: Vec<OsString>,
        cfg: &Config,
        marker: &LivenessMarker,
    ) -> Self {
        let (program, args) = match role {
            Role::Guarded => (cfg.guardian_program.clone().into_os_string(), argv.clone()),
            Role::Guardian => (argv[0].clone(), argv[1..].to_vec()),
        };

        let mut env = vec![marker.env_entry()];
        env.extend(cfg.export().into_iter().map(|(k, v)| (OsString::from(k), v)));

        Self {
            argv,
            revive: PeerCommand { program, args, env },
            peer: PeerPid::default(),
            tasks: ProtocolTasks::unset(),
        }
    }
}
