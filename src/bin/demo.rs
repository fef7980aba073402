//! `pairvisor-demo`: a guarded application that works for a while, then exits
//! cleanly and takes its guardian down with it.
//!
//! Kill it (or its guardian) with `kill -9` while it runs to watch the pair heal.

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use pairvisor::{Config, LogWriter, Subscribe};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pairvisor-demo", version, about = "Guarded demo application")]
struct Cli {
    /// Seconds of "work" before shutting the pair down.
    #[arg(long, default_value_t = 30)]
    work_secs: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    pairvisor::init_tracing();

    // The guardian relaunches argv[0]; make it an absolute path.
    let mut argv: Vec<OsString> = std::env::args_os().collect();
    if let (Some(first), Ok(exe)) = (argv.first_mut(), std::env::current_exe()) {
        *first = exe.into_os_string();
    }

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    pairvisor::keep_alive_with(argv, Config::from_env(), subs)
        .context("guardian did not come up")?;
    info!(pid = std::process::id(), work_secs = cli.work_secs, "supervised, working");

    std::thread::sleep(Duration::from_secs(cli.work_secs));

    info!("work done, shutting the pair down");
    pairvisor::let_me_die();
    // Leave the supervision thread time to signal the guardian.
    std::thread::sleep(Duration::from_secs(2));
    Ok(())
}
