//! End-to-end runs of the real `pairvisor-demo` / `pairvisor-guardian` pair.
//!
//! These tests fork real processes, deliver real `SIGUSR1`/`SIGUSR2` and `SIGKILL`,
//! and read `/proc`, so they are Linux-only and excluded from regular runs:
//! ```bash
//! cargo test --test pair -- --ignored --nocapture
//! ```

#![cfg(target_os = "linux")]

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

const DEMO: &str = env!("CARGO_BIN_EXE_pairvisor-demo");
const GUARDIAN: &str = env!("CARGO_BIN_EXE_pairvisor-guardian");

/// Kernel `comm` values are truncated to 15 bytes.
const DEMO_COMM: &str = "pairvisor-demo";
const GUARDIAN_COMM: &str = "pairvisor-guard";

/// Kills every recorded pid that is still one of ours on drop, so a failed
/// assertion leaves nothing behind.
#[derive(Default)]
struct Reaper(Vec<i32>);

impl Drop for Reaper {
    fn drop(&mut self) {
        for &pid in &self.0 {
            let ours = matches!(stat(pid), Some((_, comm, state))
                if (comm == DEMO_COMM || comm == GUARDIAN_COMM) && state != 'Z');
            if pid > 0 && ours {
                // SAFETY: plain syscall on a pid this test started or observed.
                unsafe {
                    libc::kill(pid, libc::SIGKILL);
                }
            }
        }
    }
}

fn spawn_demo(work_secs: u64) -> Child {
    Command::new(DEMO)
        .arg("--work-secs")
        .arg(work_secs.to_string())
        .env_remove("PAIRVISOR_ALIVE")
        .env("PAIRVISOR_GUARDIAN", GUARDIAN)
        .env("PAIRVISOR_HEARTBEAT_MS", "100")
        .env("PAIRVISOR_TICK_MS", "100")
        .env("PAIRVISOR_CHECK_MS", "200")
        .env("PAIRVISOR_MAX_MISSED", "3")
        .env("PAIRVISOR_BOOTSTRAP_MS", "5000")
        .env("RUST_LOG", "off")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn pairvisor-demo")
}

/// `(ppid, comm, state)` of a live process, from `/proc/<pid>/stat`.
fn stat(pid: i32) -> Option<(i32, String, char)> {
    let raw = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    let open = raw.find('(')?;
    let close = raw.rfind(')')?;
    let comm = raw[open + 1..close].to_owned();
    let mut rest = raw[close + 1..].split_whitespace();
    let state = rest.next()?.chars().next()?;
    let ppid = rest.next()?.parse().ok()?;
    Some((ppid, comm, state))
}

fn is_alive(pid: i32) -> bool {
    matches!(stat(pid), Some((_, _, state)) if state != 'Z' && state != 'X')
}

/// Live children of `parent` whose `comm` is `comm`.
fn children(parent: i32, comm: &str) -> Vec<i32> {
    let Ok(dir) = std::fs::read_dir("/proc") else {
        return Vec::new();
    };
    dir.filter_map(|e| e.ok()?.file_name().to_str()?.parse::<i32>().ok())
        .filter(|&pid| {
            matches!(stat(pid), Some((ppid, c, state))
                if ppid == parent && c == comm && state != 'Z' && state != 'X')
        })
        .collect()
}

fn wait_for<T>(timeout: Duration, mut probe: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Some(v) = probe() {
            return Some(v);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    None
}

fn wait_exit(child: &mut Child, timeout: Duration) -> Option<std::process::ExitStatus> {
    wait_for(timeout, || child.try_wait().ok().flatten())
}

#[test]
#[ignore = "spawns real processes"]
fn test_killed_guardian_is_revived_and_shut_down_with_the_app() {
    let mut reaper = Reaper::default();
    let mut app = spawn_demo(6);
    let app_pid = app.id() as i32;
    reaper.0.push(app_pid);

    let first = wait_for(Duration::from_secs(5), || {
        children(app_pid, GUARDIAN_COMM).first().copied()
    })
    .expect("guardian never started");
    reaper.0.push(first);

    // SAFETY: `first` is a live child of the app this test started.
    assert_eq!(unsafe { libc::kill(first, libc::SIGKILL) }, 0);

    let second = wait_for(Duration::from_secs(5), || {
        children(app_pid, GUARDIAN_COMM)
            .into_iter()
            .find(|&pid| pid != first)
    })
    .expect("guardian was not revived");
    reaper.0.push(second);

    let status = wait_exit(&mut app, Duration::from_secs(15)).expect("app did not finish");
    assert!(status.success(), "app exited with {status}");

    let gone = wait_for(Duration::from_secs(5), || (!is_alive(second)).then_some(()));
    assert!(gone.is_some(), "revived guardian outlived the app");
}

#[test]
#[ignore = "spawns real processes"]
fn test_killed_app_is_relaunched_by_guardian() {
    let mut reaper = Reaper::default();
    let mut app = spawn_demo(3);
    let app_pid = app.id() as i32;
    reaper.0.push(app_pid);

    let guardian = wait_for(Duration::from_secs(5), || {
        children(app_pid, GUARDIAN_COMM).first().copied()
    })
    .expect("guardian never started");
    reaper.0.push(guardian);

    app.kill().expect("kill app");
    app.wait().expect("reap app");

    let revived = wait_for(Duration::from_secs(5), || {
        children(guardian, DEMO_COMM).first().copied()
    })
    .expect("app was not relaunched");
    reaper.0.push(revived);

    // The relaunched app adopts the guardian instead of spawning another one.
    std::thread::sleep(Duration::from_millis(500));
    assert!(children(revived, GUARDIAN_COMM).is_empty());

    // Its own `let_me_die` then takes the guardian down.
    let gone = wait_for(Duration::from_secs(15), || (!is_alive(guardian)).then_some(()));
    assert!(gone.is_some(), "guardian outlived the relaunched app");
}
