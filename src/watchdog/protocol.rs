//! # Watchdog: the mutual-supervision state machine.
//!
//! One [`Watchdog`] runs per process of the pair. Both roles share the same loop;
//! only bootstrap and shutdown differ.
//!
//! ```text
//! run()
//!   ├─ link.listen(role, inbox)               heartbeat (+ shutdown for guardian)
//!   ├─ bootstrap()
//!   │    guardian: peer = parent
//!   │    guarded:  marker set?   yes ─► peer = parent                (GuardianAdopted)
//!   │                            no  ─► marker.set(), spawn guardian (GuardianSpawned)
//!   │                                   └─► await first heartbeat    (PeerReady)
//!   ├─ main_loop()
//!   │    loop {
//!   │      scheduler.run()  ── send-heartbeat / check-staleness / tick-counter
//!   │        ├─ shutdown requested ─► break
//!   │        └─ Stopped (stale)    ─► revive(): spawn peer, await first heartbeat
//!   │    }
//!   └─ finish()
//!        guarded: send Shutdown to peer (ShutdownSent)
//!        both:    SupervisionEnded
//! ```
//!
//! ## Rules
//! - The scheduler is built once; a revival resumes the same three tasks.
//! - A failed revival spawn is reported (`ReviveFailed`) and retried on the next
//!   staleness trigger.
//! - A failed bootstrap spawn clears the marker and is returned to the caller.
//! - Shutdown also ends an unbounded peer-ready wait.

use std::ffi::OsString;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::WatchdogError;
use crate::events::{Bus, Event, EventKind};
use crate::scheduler::{RunOutcome, Scheduler};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::{TaskFn, TaskOutcome};
use crate::watchdog::context::{CommContext, ProtocolTasks};
use crate::watchdog::control::{Control, Inbox, Role};
use crate::watchdog::link::{PeerLink, PeerSignal, Pid};
use crate::watchdog::liveness::Liveness;
use crate::watchdog::marker::LivenessMarker;

pub(crate) const SEND_HEARTBEAT: &str = "send-heartbeat";
pub(crate) const CHECK_STALENESS: &str = "check-staleness";
pub(crate) const TICK_COUNTER: &str = "tick-counter";

/// Supervision loop for one process of the pair.
///
/// # Example
/// ```no_run
/// use pairvisor::{Config, OsLink, Role, Watchdog};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), pairvisor::WatchdogError> {
///     let argv = std::env::args_os().skip(1).collect::<Vec<_>>();
///     Watchdog::new(Role::Guardian, argv, Config::from_env(), OsLink::new())?
///         .run()
///         .await
/// }
/// ```
pub struct Watchdog<L: PeerLink> {
    role: Role,
    cfg: Config,
    link: Arc<L>,
    liveness: Liveness,
    marker: LivenessMarker,
    control: Control,
    bus: Bus,
    scheduler: Scheduler,
    ctx: CommContext,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<L: PeerLink> Watchdog<L> {
    /// Builds a watchdog for `role`.
    ///
    /// `argv` is the guarded program's argument vector; `argv[0]` names the program
    /// the guardian revives.
    pub fn new<I, S>(role: Role, argv: I, cfg: Config, link: L) -> Result<Self, WatchdogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        if argv.is_empty() {
            return Err(WatchdogError::MissingProgram);
        }

        let bus = Bus::new(cfg.bus_capacity_clamped());
        let scheduler = Scheduler::with_bus(bus.clone());
        let control = Control::new(scheduler.stop_handle(), bus.clone());
        let marker = LivenessMarker::for_process(cfg.marker_var.clone());
        let ctx = CommContext::new(role, argv, &cfg, &marker);

        Ok(Self {
            role,
            cfg,
            link: Arc::new(link),
            liveness: Liveness::new(),
            marker,
            control,
            bus,
            scheduler,
            ctx,
            subscribers: Vec::new(),
        })
    }

    /// Replaces the liveness marker (and the marker entry passed to spawned peers).
    pub fn with_marker(mut self, marker: LivenessMarker) -> Self {
        let argv = std::mem::take(&mut self.ctx.argv);
        self.ctx = CommContext::new(self.role, argv, &self.cfg, &marker);
        self.marker = marker;
        self
    }

    /// Subscribers that receive this watchdog's events while it runs.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Graceful-shutdown handle.
    pub fn control(&self) -> Control {
        self.control.clone()
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub fn bus(&self) -> Bus {
        self.bus.clone()
    }

    pub fn marker(&self) -> &LivenessMarker {
        &self.marker
    }

    /// Current peer pid (0 before bootstrap).
    pub fn peer(&self) -> Pid {
        self.ctx.peer.get()
    }

    /// Ids of the protocol tasks (bad until the main loop starts).
    pub fn tasks(&self) -> ProtocolTasks {
        self.ctx.tasks
    }

    /// Runs supervision until shutdown is requested.
    ///
    /// Returns an error only if bootstrap fails.
    pub async fn run(mut self) -> Result<(), WatchdogError> {
        let done = CancellationToken::new();
        let set = Arc::new(SubscriberSet::new(
            std::mem::take(&mut self.subscribers),
            self.bus.clone(),
        ));
        let listener = self.subscriber_listener(Arc::clone(&set), done.clone());

        let res = self.supervise().await;

        done.cancel();
        let _ = listener.await;
        if let Ok(set) = Arc::try_unwrap(set) {
            set.shutdown().await;
        }
        res
    }

    async fn supervise(&mut self) -> Result<(), WatchdogError> {
        let inbox = Inbox::new(self.liveness.clone(), self.control.clone());
        self.link
            .listen(self.role, inbox)
            .map_err(WatchdogError::Listen)?;

        self.bootstrap().await?;
        self.main_loop().await;
        self.finish();
        Ok(())
    }

    async fn bootstrap(&mut self) -> Result<(), WatchdogError> {
        if self.role == Role::Guardian {
            self.ctx.peer.set(self.link.parent());
            return Ok(());
        }

        if self.marker.is_set() {
            let parent = self.link.parent();
            self.ctx.peer.set(parent);
            self.bus
                .publish(Event::new(EventKind::GuardianAdopted).with_peer(parent));
            return Ok(());
        }

        self.marker.set();
        let seen = self.liveness.generation();
        match self.link.spawn(&self.ctx.revive) {
            Ok(pid) => {
                self.ctx.peer.set(pid);
                self.bus
                    .publish(Event::new(EventKind::GuardianSpawned).with_peer(pid));
                self.await_peer(seen).await;
                Ok(())
            }
            Err(source) => {
                self.marker.clear();
                Err(WatchdogError::Spawn {
                    program: self.ctx.revive.program.clone(),
                    source,
                })
            }
        }
    }

    async fn main_loop(&mut self) {
        self.install_tasks();
        let control = self.control.clone();

        while !control.is_shutdown() {
            let outcome = tokio::select! {
                outcome = self.scheduler.run() => outcome,
                _ = control.cancelled() => break,
            };
            if control.is_shutdown() || outcome == RunOutcome::Complete {
                break;
            }
            self.revive().await;
        }
    }

    /// Spawns a replacement peer and waits for its first heartbeat.
    async fn revive(&mut self) {
        self.bus
            .publish(Event::new(EventKind::ReviveStarted).with_peer(self.ctx.peer.get()));

        let seen = self.liveness.generation();
        match self.link.spawn(&self.ctx.revive) {
            Ok(pid) => {
                self.ctx.peer.set(pid);
                self.await_peer(seen).await;
            }
            Err(e) => {
                self.bus
                    .publish(Event::new(EventKind::ReviveFailed).with_reason(e.to_string()));
            }
        }
    }

    /// Unbounded wait for a heartbeat newer than `seen`; false if shutdown came first.
    async fn await_peer(&mut self, seen: u64) -> bool {
        let liveness = self.liveness.clone();
        let control = self.control.clone();
        tokio::select! {
            _ = liveness.wait_since(seen) => {
                self.bus
                    .publish(Event::new(EventKind::PeerReady).with_peer(self.ctx.peer.get()));
                true
            }
            _ = control.cancelled() => false,
        }
    }

    fn finish(&mut self) {
        if self.role == Role::Guarded {
            let peer = self.ctx.peer.get();
            let mut ev = Event::new(EventKind::ShutdownSent).with_peer(peer);
            if let Err(e) = self.link.send(peer, PeerSignal::Shutdown) {
                ev = ev.with_reason(e.to_string());
            }
            self.bus.publish(ev);
        }
        self.scheduler.clear();
        self.bus.publish(Event::new(EventKind::SupervisionEnded));
    }

    /// Loads send-heartbeat, check-staleness and tick-counter, all due now.
    fn install_tasks(&mut self) {
        if !self.ctx.tasks.heartbeat.is_bad() {
            return;
        }
        let now = Instant::now();

        let link = Arc::clone(&self.link);
        let peer = self.ctx.peer.clone();
        let bus = self.bus.clone();
        let heartbeat = self.scheduler.add_task(
            TaskFn::new(SEND_HEARTBEAT, move || {
                let pid = peer.get();
                match link.send(pid, PeerSignal::Heartbeat) {
                    Ok(()) => bus.publish(Event::new(EventKind::HeartbeatSent).with_peer(pid)),
                    Err(e) => bus.publish(
                        Event::new(EventKind::HeartbeatSendFailed)
                            .with_peer(pid)
                            .with_reason(e.to_string()),
                    ),
                }
                TaskOutcome::Repeat
            }),
            now,
            self.cfg.heartbeat_every(),
        );

        let liveness = self.liveness.clone();
        let stop = self.scheduler.stop_handle();
        let peer = self.ctx.peer.clone();
        let bus = self.bus.clone();
        let max_missed = self.cfg.max_missed;
        let check = self.scheduler.add_task(
            TaskFn::new(CHECK_STALENESS, move || {
                let ticks = liveness.stale_ticks();
                if ticks > max_missed {
                    bus.publish(
                        Event::new(EventKind::PeerStale)
                            .with_peer(peer.get())
                            .with_stale_ticks(ticks),
                    );
                    liveness.reset();
                    stop.stop();
                }
                TaskOutcome::Repeat
            }),
            now,
            self.cfg.check_every(),
        );

        let liveness = self.liveness.clone();
        let tick = self.scheduler.add_task(
            TaskFn::new(TICK_COUNTER, move || {
                liveness.tick();
                TaskOutcome::Repeat
            }),
            now,
            self.cfg.tick_every(),
        );

        self.ctx.tasks = ProtocolTasks {
            heartbeat,
            check,
            tick,
        };
    }

    /// Forwards bus events to the subscriber set until `done`, then drains.
    fn subscriber_listener(
        &self,
        set: Arc<SubscriberSet>,
        done: CancellationToken,
    ) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    got = rx.recv() => match got {
                        Ok(ev) => set.emit(&ev),
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    },
                    _ = done.cancelled() => {
                        while let Ok(ev) = rx.try_recv() {
                            set.emit(&ev);
                        }
                        break;
                    }
                }
            }
        })
    }
}

impl<L: PeerLink> std::fmt::Debug for Watchdog<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchdog")
            .field("role", &self.role)
            .field("peer", &self.ctx.peer.get())
            .field("marker", &self.marker.var())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::sync::broadcast;

    use crate::watchdog::testing::FakeLink;

    fn argv() -> Vec<&'static str> {
        vec!["/usr/bin/app", "--serve"]
    }

    fn cfg() -> Config {
        let mut cfg = Config::default();
        cfg.guardian_program = PathBuf::from("/opt/pairvisor-guardian");
        cfg
    }

    fn fresh_marker(name: &str) -> LivenessMarker {
        LivenessMarker::new(format!("PAIRVISOR_TEST_{name}_NEVER_EXPORTED"))
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    fn kinds(events: &[Event]) -> Vec<EventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_guarded_bootstrap_spawns_guardian_and_sets_marker() {
        let link = FakeLink::new().with_parent(10).ready_on_spawn(true);
        let marker = fresh_marker("SPAWN");
        let wd = Watchdog::new(Role::Guarded, argv(), cfg(), link.clone())
            .unwrap()
            .with_marker(marker.clone());
        let control = wd.control();
        let liveness = wd.liveness();
        let mut rx = wd.bus().subscribe();

        let handle = tokio::spawn(wd.run());
        tokio::time::timeout(Duration::from_secs(5), liveness.wait_since(0))
            .await
            .expect("bootstrap heartbeat");
        assert!(marker.is_set());

        let spawns = link.spawns();
        assert_eq!(spawns.len(), 1);
        assert_eq!(spawns[0].program, OsString::from("/opt/pairvisor-guardian"));
        assert_eq!(spawns[0].args, argv().into_iter().map(OsString::from).collect::<Vec<_>>());
        assert!(spawns[0].env.contains(&marker.env_entry()));

        tokio::time::sleep(Duration::from_secs(3)).await;
        control.request_shutdown();
        handle.await.unwrap().unwrap();

        let guardian = link.first_spawned_pid();
        assert!(link.sent().contains(&(guardian, PeerSignal::Heartbeat)));
        assert_eq!(link.sent().last(), Some(&(guardian, PeerSignal::Shutdown)));

        let events = kinds(&drain(&mut rx));
        assert!(events.contains(&EventKind::GuardianSpawned));
        assert!(events.contains(&EventKind::PeerReady));
        assert!(events.contains(&EventKind::ShutdownSent));
        assert_eq!(events.last(), Some(&EventKind::SupervisionEnded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guarded_adopts_parent_when_marker_set() {
        let link = FakeLink::new().with_parent(77).with_alive(77);
        let marker = fresh_marker("ADOPT");
        marker.set();
        let wd = Watchdog::new(Role::Guarded, argv(), cfg(), link.clone())
            .unwrap()
            .with_marker(marker);
        let control = wd.control();
        let mut rx = wd.bus().subscribe();

        let handle = tokio::spawn(wd.run());
        tokio::time::sleep(Duration::from_secs(10)).await;
        control.request_shutdown();
        handle.await.unwrap().unwrap();

        assert!(link.spawns().is_empty());
        assert!(link.sent().contains(&(77, PeerSignal::Heartbeat)));
        let events = kinds(&drain(&mut rx));
        assert!(events.contains(&EventKind::GuardianAdopted));
        assert!(!events.contains(&EventKind::PeerStale));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_spawn_failure_clears_marker() {
        let link = FakeLink::new().fail_spawns(1);
        let marker = fresh_marker("FAIL");
        let wd = Watchdog::new(Role::Guarded, argv(), cfg(), link.clone())
            .unwrap()
            .with_marker(marker.clone());

        let err = wd.run().await.unwrap_err();
        assert_eq!(err.as_label(), "watchdog_spawn");
        assert!(!marker.is_set());
        assert!(link.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_ends_unbounded_peer_wait() {
        let link = FakeLink::new().ready_on_spawn(false);
        let wd = Watchdog::new(Role::Guarded, argv(), cfg(), link.clone())
            .unwrap()
            .with_marker(fresh_marker("WAIT"));
        let control = wd.control();

        let handle = tokio::spawn(wd.run());
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!handle.is_finished());

        control.request_shutdown();
        handle.await.unwrap().unwrap();
        let guardian = link.first_spawned_pid();
        assert_eq!(link.sent(), vec![(guardian, PeerSignal::Shutdown)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guardian_revives_stale_peer_and_resumes() {
        let link = FakeLink::new().with_parent(100).with_alive(100).ready_on_spawn(true);
        let wd = Watchdog::new(Role::Guardian, argv(), cfg(), link.clone()).unwrap();
        let control = wd.control();
        let mut rx = wd.bus().subscribe();

        let handle = tokio::spawn(wd.run());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(link.spawns().is_empty());

        link.kill(100);
        tokio::time::sleep(Duration::from_secs(15)).await;

        let spawns = link.spawns();
        assert_eq!(spawns.len(), 1);
        assert_eq!(spawns[0].program, OsString::from("/usr/bin/app"));
        assert_eq!(spawns[0].args, vec![OsString::from("--serve")]);
        let revived = link.first_spawned_pid();
        assert!(link.sent().contains(&(revived, PeerSignal::Heartbeat)));

        control.request_shutdown();
        handle.await.unwrap().unwrap();

        let events = drain(&mut rx);
        let stale = events
            .iter()
            .find(|e| e.kind == EventKind::PeerStale)
            .expect("stale event");
        assert_eq!(stale.peer, Some(100));
        assert!(stale.stale_ticks.unwrap() > 3);

        let order: Vec<EventKind> = kinds(&events)
            .into_iter()
            .filter(|k| {
                matches!(
                    k,
                    EventKind::PeerStale | EventKind::ReviveStarted | EventKind::PeerReady
                )
            })
            .collect();
        assert_eq!(
            order,
            vec![EventKind::PeerStale, EventKind::ReviveStarted, EventKind::PeerReady]
        );
        // The guardian never tells the application to shut down.
        assert!(!link.sent().iter().any(|(_, s)| *s == PeerSignal::Shutdown));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_revival_is_retried() {
        let link = FakeLink::new().with_parent(100).ready_on_spawn(true).fail_spawns(1);
        let wd = Watchdog::new(Role::Guardian, argv(), cfg(), link.clone()).unwrap();
        let control = wd.control();
        let mut rx = wd.bus().subscribe();

        let handle = tokio::spawn(wd.run());
        tokio::time::sleep(Duration::from_secs(30)).await;
        control.request_shutdown();
        handle.await.unwrap().unwrap();

        assert_eq!(link.spawns().len(), 1);
        let events = kinds(&drain(&mut rx));
        let failed = events.iter().position(|k| *k == EventKind::ReviveFailed);
        let ready = events.iter().position(|k| *k == EventKind::PeerReady);
        assert!(matches!((failed, ready), (Some(f), Some(r)) if f < r));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guardian_stops_on_shutdown_signal() {
        let link = FakeLink::new().with_parent(100).with_alive(100);
        let wd = Watchdog::new(Role::Guardian, argv(), cfg(), link.clone()).unwrap();
        let mut rx = wd.bus().subscribe();

        let handle = tokio::spawn(wd.run());
        tokio::time::sleep(Duration::from_secs(2)).await;
        link.inbox().expect("listener installed").shutdown();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("guardian exits promptly")
            .unwrap()
            .unwrap();

        let events = kinds(&drain(&mut rx));
        assert!(events.contains(&EventKind::ShutdownRequested));
        assert!(!events.contains(&EventKind::ShutdownSent));
        assert_eq!(events.last(), Some(&EventKind::SupervisionEnded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tasks_are_installed_once_in_protocol_order() {
        let link = FakeLink::new().with_parent(5).with_alive(5);
        let mut wd = Watchdog::new(Role::Guardian, argv(), cfg(), link).unwrap();
        wd.install_tasks();
        let first = wd.tasks();
        wd.install_tasks();

        assert_eq!(wd.scheduler.len(), 3);
        assert!(wd.tasks().heartbeat.is_same(&first.heartbeat));
        assert!(first.heartbeat.counter() < first.check.counter());
        assert!(first.check.counter() < first.tick.counter());
        assert!(wd.scheduler.contains(first.tick));
    }

    #[test]
    fn test_empty_argv_is_rejected() {
        let err = Watchdog::new(Role::Guardian, Vec::<OsString>::new(), cfg(), FakeLink::new())
            .unwrap_err();
        assert!(matches!(err, WatchdogError::MissingProgram));
    }
}
