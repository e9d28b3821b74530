//! `lattice-server` — the TCP front end for the latticekv storage engine.
//!
//! `lattice-server <port> <data_dir> [--debug]` opens (or creates) the
//! store at `data_dir`, binds `port` on localhost, and serves the
//! line-delimited JSON protocol until killed.

mod protocol;
mod server;

use std::process;
use std::sync::Arc;

use clap::Parser;
use lattice_engine::{CheckpointPolicy, Engine, EngineConfig};

/// TCP front end for the latticekv storage engine.
#[derive(Parser, Debug)]
#[command(name = "lattice-server")]
struct Args {
    /// TCP port to listen on.
    port: u16,

    /// Directory holding `store.lock`, `wal.log`, and `data.json`.
    data_dir: std::path::PathBuf,

    /// Inject a 1% chance of skipping each checkpoint's snapshot write,
    /// to exercise WAL-only recovery.
    #[arg(long)]
    debug: bool,
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = EngineConfig {
        debug: args.debug,
        checkpoint_policy: CheckpointPolicy::EveryMutation,
    };

    let engine = match Engine::open(&args.data_dir, config) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            eprintln!("failed to open store at {}: {}", args.data_dir.display(), e);
            process::exit(1);
        }
    };

    if let Err(e) = server::serve(args.port, engine) {
        eprintln!("server error: {}", e);
        process::exit(1);
    }
}
