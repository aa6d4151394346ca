//! # connectome-cli
//!
//! Library half of the `connectome` binary: argument definitions,
//! environment config, CSV I/O and the two subcommand drivers.
//!
//! ```text
//! connectome cascade --adjacency adj.csv --sources 0-9 --stops 90-99 \
//!     --mode cascade --p 0.05 --no-loops --out hist.csv --features-out feats.csv
//! connectome cluster --features feats.csv --labels-out labels.csv \
//!     --linkage-out linkage.csv --print-tree samples
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod io;

pub use cli::{Cli, Command};
pub use config::Config;

/// Dispatch a parsed command line.
pub fn run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    match &cli.command {
        Command::Cascade(args) => {
            let summary = commands::run_cascade(args, config)?;
            tracing::info!(
                reached_stop = summary.outcomes.reached_stop,
                dead_end     = summary.outcomes.dead_end,
                budget_spent = summary.outcomes.hop_budget_exceeded,
                out          = %args.out.display(),
                "cascade run written"
            );
        }
        Command::Cluster(args) => {
            let summary = commands::run_cluster(args, config)?;
            tracing::info!(
                leaves = summary.n_leaves,
                depth  = summary.depth,
                out    = %args.labels_out.display(),
                "cluster labels written"
            );
        }
    }
    Ok(())
}
