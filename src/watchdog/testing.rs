//! In-memory [`PeerLink`] for protocol tests.

use std::collections::HashSet;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::watchdog::control::{Inbox, Role};
use crate::watchdog::link::{PeerCommand, PeerLink, PeerSignal, Pid};

#[derive(Default)]
struct State {
    parent: Pid,
    next_pid: Pid,
    alive: HashSet<Pid>,
    ready_on_spawn: bool,
    fail_spawns: usize,
    spawns: Vec<(PeerCommand, Pid)>,
    sent: Vec<(Pid, PeerSignal)>,
    inbox: Option<Inbox>,
}

/// Records spawns and signals. Pids in the alive set answer every heartbeat with
/// one of their own; freshly spawned pids are alive if `ready_on_spawn` is set.
#[derive(Clone)]
pub(crate) struct FakeLink {
    state: Arc<Mutex<State>>,
}

impl FakeLink {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                parent: 1,
                next_pid: 1000,
                ..State::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub(crate) fn with_parent(self, pid: Pid) -> Self {
        self.lock().parent = pid;
        self
    }

    pub(crate) fn with_alive(self, pid: Pid) -> Self {
        self.lock().alive.insert(pid);
        self
    }

    /// A spawned peer heartbeats at once and stays alive.
    pub(crate) fn ready_on_spawn(self, on: bool) -> Self {
        self.lock().ready_on_spawn = on;
        self
    }

    /// The next `n` spawns fail.
    pub(crate) fn fail_spawns(self, n: usize) -> Self {
        self.lock().fail_spawns = n;
        self
    }

    pub(crate) fn kill(&self, pid: Pid) {
        self.lock().alive.remove(&pid);
    }

    pub(crate) fn spawns(&self) -> Vec<PeerCommand> {
        self.lock().spawns.iter().map(|(cmd, _)| cmd.clone()).collect()
    }

    pub(crate) fn first_spawned_pid(&self) -> Pid {
        self.lock().spawns.first().map(|(_, pid)| *pid).unwrap_or_default()
    }

    pub(crate) fn sent(&self) -> Vec<(Pid, PeerSignal)> {
        self.lock().sent.clone()
    }

    pub(crate) fn inbox(&self) -> Option<Inbox> {
        self.lock().inbox.clone()
    }
}

impl PeerLink for FakeLink {
    fn spawn(&self, cmd: &PeerCommand) -> io::Result<Pid> {
        let (pid, ready) = {
            let mut st = self.lock();
            if st.fail_spawns > 0 {
                st.fail_spawns -= 1;
                return Err(io::Error::other("fork: resource temporarily unavailable"));
            }
            let pid = st.next_pid;
            st.next_pid += 1;
            st.spawns.push((cmd.clone(), pid));
            if st.ready_on_spawn {
                st.alive.insert(pid);
            }
            (pid, st.ready_on_spawn.then(|| st.inbox.clone()).flatten())
        };
        if let Some(inbox) = ready {
            inbox.heartbeat();
        }
        Ok(pid)
    }

    fn send(&self, pid: Pid, signal: PeerSignal) -> io::Result<()> {
        let reply = {
            let mut st = self.lock();
            st.sent.push((pid, signal));
            if !st.alive.contains(&pid) {
                return Err(io::Error::from_raw_os_error(libc::ESRCH));
            }
            match signal {
                PeerSignal::Heartbeat => st.inbox.clone(),
                PeerSignal::Shutdown => None,
            }
        };
        if let Some(inbox) = reply {
            inbox.heartbeat();
        }
        Ok(())
    }

    fn parent(&self) -> Pid {
        self.lock().parent
    }

    fn listen(&self, _role: Role, inbox: Inbox) -> io::Result<()> {
        self.lock().inbox = Some(inbox);
        Ok(())
    }
}
