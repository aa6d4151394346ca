//! `connectome` command-line driver.
//!
//! Settings not given as flags come from environment variables (see
//! [`connectome_cli::config`]).
//!
//! ```bash
//! CONNECTOME_LOG=connectome_cluster=debug,info \
//! CONNECTOME_PARALLEL=1 \
//!   cargo run --bin connectome --release -- cluster --features feats.csv --labels-out labels.csv
//! ```

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use connectome_cli::{Cli, Config};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ───────────────────────────────────────────────────────────────
    let filter = EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "connectome starting");

    let config = Config::from_env();
    connectome_cli::run(&cli, &config)
}
