//! # Application-facing API: `keep_alive` and `let_me_die`.
//!
//! ```text
//! caller thread                         supervision thread (current-thread runtime)
//! ─────────────                         ───────────────────────────────────────────
//! keep_alive(argv)
//!   ├─ spawn ─────────────────────────► Watchdog(Guarded).run()
//!   │                                     ├─ waiter: liveness.wait_since(0) ─► Ok(())
//!   │                                     └─ bootstrap error ────────────────► Err(e)
//!   └─ recv_timeout(bootstrap_timeout) ◄──┘
//!        Ok / Err(e) / Err(BootstrapTimeout)
//!
//! let_me_die()
//!   └─ Control::request_shutdown() ─────► loop exits, Shutdown sent to guardian
//! ```
//!
//! Supervision keeps going after a `BootstrapTimeout`; only the synchronous answer
//! is given up on.

use std::ffi::OsString;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::Config;
use crate::error::WatchdogError;
use crate::subscribers::Subscribe;
use crate::watchdog::control::{Control, Role};
use crate::watchdog::link::{OsLink, PeerLink};
use crate::watchdog::marker::LivenessMarker;
use crate::watchdog::protocol::Watchdog;

/// Shutdown handle of the supervision loop started by `keep_alive`, if any.
static ACTIVE: Mutex<Option<Control>> = Mutex::new(None);

fn active() -> MutexGuard<'static, Option<Control>> {
    ACTIVE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Starts supervising this process with a guardian.
///
/// `args` is this program's argument vector (`args[0]` is the program to relaunch).
/// Configuration comes from [`Config::from_env`]. Returns once the guardian's first
/// heartbeat arrives, or with [`WatchdogError::BootstrapTimeout`] after
/// `bootstrap_timeout`.
pub fn keep_alive<I, S>(args: I) -> Result<(), WatchdogError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    keep_alive_with(args, Config::from_env(), Vec::new())
}

/// Like [`keep_alive`] with explicit configuration and event subscribers.
pub fn keep_alive_with<I, S>(
    args: I,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
) -> Result<(), WatchdogError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let marker = LivenessMarker::for_process(cfg.marker_var.clone());
    keep_alive_on(args, cfg, subscribers, OsLink::new(), marker)
}

pub(crate) fn keep_alive_on<I, S, L>(
    args: I,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    link: L,
    marker: LivenessMarker,
) -> Result<(), WatchdogError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    L: PeerLink,
{
    let timeout = cfg.bootstrap_timeout;
    let watchdog = {
        let mut slot = active();
        if slot.is_some() {
            return Err(WatchdogError::AlreadyRunning);
        }
        let watchdog = Watchdog::new(Role::Guarded, args, cfg, link)?
            .with_marker(marker)
            .with_subscribers(subscribers);
        *slot = Some(watchdog.control());
        watchdog
    };

    let (tx, rx) = mpsc::channel::<Result<(), WatchdogError>>();
    let spawned = std::thread::Builder::new()
        .name("pairvisor-supervision".into())
        .spawn(move || supervise(watchdog, tx));
    if let Err(e) = spawned {
        active().take();
        return Err(WatchdogError::Thread(e));
    }

    match rx.recv_timeout(timeout) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            active().take();
            Err(e)
        }
        Err(RecvTimeoutError::Timeout) => Err(WatchdogError::BootstrapTimeout { timeout }),
        Err(RecvTimeoutError::Disconnected) => {
            active().take();
            Err(WatchdogError::Disconnected)
        }
    }
}

/// Body of the supervision thread.
fn supervise<L: PeerLink>(watchdog: Watchdog<L>, tx: mpsc::Sender<Result<(), WatchdogError>>) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            let _ = tx.send(Err(WatchdogError::Runtime(e)));
            return;
        }
    };

    rt.block_on(async move {
        let liveness = watchdog.liveness();
        let ready = tx.clone();
        let waiter = tokio::spawn(async move {
            liveness.wait_since(0).await;
            let _ = ready.send(Ok(()));
        });

        let res = watchdog.run().await;
        waiter.abort();
        if let Err(e) = res {
            let _ = tx.send(Err(e));
        }
    });
}

/// Ends supervision started by [`keep_alive`]; the guardian is told to exit too.
///
/// Does not block. Returns `false` if nothing was being supervised.
pub fn let_me_die() -> bool {
    match active().take() {
        Some(control) => {
            control.request_shutdown();
            true
        }
        None => false,
    }
}
