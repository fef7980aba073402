//! # Watchdog configuration.
//!
//! [`Config`] holds the protocol cadence (heartbeat, tick and check intervals),
//! the staleness threshold, the bootstrap timeout, where to find the guardian
//! executable and the name of the liveness-marker variable.
//!
//! Both processes of a pair must agree on the cadence, so the timing fields are
//! exported into every spawned peer's environment ([`Config::export`]) and read
//! back with [`Config::from_env`].
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use pairvisor::Config;
//!
//! let mut cfg = Config::default();
//! cfg.heartbeat_interval = Duration::from_millis(500);
//! cfg.max_missed = 5;
//!
//! assert_eq!(cfg.check_interval, Duration::from_secs(2));
//! assert_eq!(cfg.marker_var, "PAIRVISOR_ALIVE");
//! ```

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// File name of the guardian binary shipped with this crate.
pub const GUARDIAN_BIN: &str = "pairvisor-guardian";

/// Overrides the guardian executable path.
pub const ENV_GUARDIAN: &str = "PAIRVISOR_GUARDIAN";
/// Heartbeat interval in milliseconds.
pub const ENV_HEARTBEAT_MS: &str = "PAIRVISOR_HEARTBEAT_MS";
/// Staleness tick interval in milliseconds.
pub const ENV_TICK_MS: &str = "PAIRVISOR_TICK_MS";
/// Staleness check interval in milliseconds.
pub const ENV_CHECK_MS: &str = "PAIRVISOR_CHECK_MS";
/// Staleness threshold in ticks.
pub const ENV_MAX_MISSED: &str = "PAIRVISOR_MAX_MISSED";
/// Bootstrap timeout in milliseconds.
pub const ENV_BOOTSTRAP_MS: &str = "PAIRVISOR_BOOTSTRAP_MS";

/// Configuration shared by both roles.
#[derive(Clone, Debug)]
pub struct Config {
    /// How often a heartbeat is sent to the peer.
    pub heartbeat_interval: Duration,
    /// How often the staleness counter is incremented.
    pub tick_interval: Duration,
    /// How often the staleness counter is compared with `max_missed`.
    pub check_interval: Duration,
    /// The peer is stale once the counter is strictly greater than this.
    pub max_missed: u64,
    /// Bounded wait for the first heartbeat in [`keep_alive`](crate::keep_alive).
    pub bootstrap_timeout: Duration,
    /// Executable the guarded process launches as its guardian.
    pub guardian_program: PathBuf,
    /// Environment variable used as the liveness marker.
    pub marker_var: String,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `heartbeat_interval = 1s`, `tick_interval = 1s`, `check_interval = 2s`
    /// - `max_missed = 3`
    /// - `bootstrap_timeout = 5s`
    /// - `guardian_program = <dir of current exe>/pairvisor-guardian`
    /// - `marker_var = "PAIRVISOR_ALIVE"`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(1),
            tick_interval: Duration::from_secs(1),
            check_interval: Duration::from_secs(2),
            max_missed: 3,
            bootstrap_timeout: Duration::from_secs(5),
            guardian_program: default_guardian_program(),
            marker_var: "PAIRVISOR_ALIVE".to_string(),
            bus_capacity: 1024,
        }
    }
}

impl Config {
    /// Defaults overlaid with the `PAIRVISOR_*` process environment.
    ///
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Defaults overlaid with values produced by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let mut cfg = Self::default();
        let millis = |key: &str| {
            lookup(key)
                .and_then(|v| v.into_string().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
        };

        if let Some(path) = lookup(ENV_GUARDIAN).filter(|p| !p.is_empty()) {
            cfg.guardian_program = PathBuf::from(path);
        }
        if let Some(ms) = millis(ENV_HEARTBEAT_MS) {
            cfg.heartbeat_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = millis(ENV_TICK_MS) {
            cfg.tick_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = millis(ENV_CHECK_MS) {
            cfg.check_interval = Duration::from_millis(ms);
        }
        if let Some(n) = millis(ENV_MAX_MISSED) {
            cfg.max_missed = n;
        }
        if let Some(ms) = millis(ENV_BOOTSTRAP_MS) {
            cfg.bootstrap_timeout = Duration::from_millis(ms);
        }
        cfg
    }

    /// Environment entries that reproduce this configuration in a peer.
    pub fn export(&self) -> Vec<(&'static str, OsString)> {
        let ms = |d: Duration| OsString::from(d.as_millis().to_string());
        vec![
            (ENV_GUARDIAN, self.guardian_program.clone().into_os_string()),
            (ENV_HEARTBEAT_MS, ms(self.heartbeat_interval)),
            (ENV_TICK_MS, ms(self.tick_interval)),
            (ENV_CHECK_MS, ms(self.check_interval)),
            (ENV_MAX_MISSED, OsString::from(self.max_missed.to_string())),
            (ENV_BOOTSTRAP_MS, ms(self.bootstrap_timeout)),
        ]
    }

    #[inline]
    pub fn heartbeat_every(&self) -> Duration {
        non_zero(self.heartbeat_interval)
    }

    #[inline]
    pub fn tick_every(&self) -> Duration {
        non_zero(self.tick_interval)
    }

    #[inline]
    pub fn check_every(&self) -> Duration {
        non_zero(self.check_interval)
    }

    /// Bus capacity clamped to at least 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

fn non_zero(d: Duration) -> Duration {
    if d.is_zero() { Duration::from_millis(1) } else { d }
}

fn default_guardian_program() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(GUARDIAN_BIN)))
        .unwrap_or_else(|| PathBuf::from(GUARDIAN_BIN))
}
