//! Guardian-role entry point, used by the `pairvisor-guardian` binary.

use std::ffi::OsString;
use std::sync::Arc;

use crate::config::Config;
use crate::error::WatchdogError;
use crate::subscribers::Subscribe;
use crate::watchdog::control::Role;
use crate::watchdog::link::OsLink;
use crate::watchdog::protocol::Watchdog;

/// Guards the process that launched this one until it sends the shutdown signal.
///
/// `argv` is the guarded program's argument vector, exactly as the guarded process
/// passed it; `argv[0]` is relaunched whenever the guarded process goes silent.
pub async fn run_guardian<I, S>(
    argv: I,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
) -> Result<(), WatchdogError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    Watchdog::new(Role::Guardian, argv, cfg, OsLink::new())?
        .with_subscribers(subscribers)
        .run()
        .await
}
