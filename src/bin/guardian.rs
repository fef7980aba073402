//! `pairvisor-guardian`: the guardian half of a pair.
//!
//! Launched by `keep_alive` with the guarded program's argv as its arguments.

use std::ffi::OsString;
use std::sync::Arc;

use clap::Parser;
use pairvisor::{Config, LogWriter, Subscribe};

#[derive(Parser, Debug)]
#[command(name = "pairvisor-guardian", version, about = "Guardian process of a pairvisor pair")]
struct Cli {
    /// Suppress event logging.
    #[arg(long, env = "PAIRVISOR_QUIET")]
    quiet: bool,

    /// Guarded program followed by its arguments.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    argv: Vec<OsString>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    pairvisor::init_tracing();

    let subs: Vec<Arc<dyn Subscribe>> = if cli.quiet {
        Vec::new()
    } else {
        vec![Arc::new(LogWriter::new())]
    };

    pairvisor::run_guardian(cli.argv, Config::from_env(), subs).await?;
    Ok(())
}
