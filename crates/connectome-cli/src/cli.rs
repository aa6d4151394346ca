//! Command-line surface.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "connectome")]
#[command(about = "Cascade simulation and divisive clustering over weighted connectomes")]
pub struct Cli {
    /// tracing filter, e.g. `connectome_traverse=debug,info`
    #[arg(long, global = true, env = "CONNECTOME_LOG", default_value = "info")]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run many random walks or cascades and write per-hop visit counts
    Cascade(CascadeArgs),
    /// Grow a divisive cluster tree over feature rows
    Cluster(ClusterArgs),
}

// ─────────────────────────────────────────────
// cascade
// ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Markov random walk on row-normalized weights
    Walk,
    /// Spreading activation with per-edge transmission probability `p`
    Cascade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    Forward,
    /// Reverse every edge: which upstream nodes reach the sources
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Collect {
    None,
    Successful,
    All,
}

#[derive(Debug, Args)]
pub struct CascadeArgs {
    /// Dense square adjacency matrix (CSV, row = presynaptic)
    #[arg(long)]
    pub adjacency: PathBuf,

    /// Source nodes, e.g. `0,3,10-19`
    #[arg(long)]
    pub sources: NodeList,

    /// Stop nodes, same syntax as `--sources`
    #[arg(long)]
    pub stops: Option<NodeList>,

    #[arg(long, value_enum, default_value = "cascade")]
    pub mode: Mode,

    #[arg(long, value_enum, default_value = "forward")]
    pub direction: Direction,

    /// Per-synapse transmission probability (cascade mode)
    #[arg(long, default_value = "0.05")]
    pub p: f64,

    #[arg(long, default_value = "10")]
    pub max_hops: usize,

    /// Trajectories per source [env: CONNECTOME_N_INIT]
    #[arg(long)]
    pub n_init: Option<usize>,

    /// Advance one active node per hop instead of the whole frontier
    #[arg(long)]
    pub sequential: bool,

    /// Forbid re-entering visited nodes
    #[arg(long)]
    pub no_loops: bool,

    /// [env: CONNECTOME_SEED]
    #[arg(long)]
    pub seed: Option<u64>,

    /// [env: CONNECTOME_PARALLEL]
    #[arg(long)]
    pub parallel: bool,

    /// [env: CONNECTOME_COLLECT_PATHS]
    #[arg(long, value_enum)]
    pub collect: Option<Collect>,

    /// Hop histogram output (CSV, one row per hop)
    #[arg(long)]
    pub out: PathBuf,

    /// Collected trajectories (CSV)
    #[arg(long)]
    pub paths_out: Option<PathBuf>,

    /// One feature row per source: its own histogram, flattened and
    /// divided by `n_init` (CSV, input for `cluster`)
    #[arg(long)]
    pub features_out: Option<PathBuf>,

    /// Run summary (JSON)
    #[arg(long)]
    pub report: Option<PathBuf>,
}

// ─────────────────────────────────────────────
// cluster
// ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Weight {
    Leaves,
    Samples,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrintField {
    Samples,
    Bic,
}

#[derive(Debug, Args)]
pub struct ClusterArgs {
    /// Feature matrix, one row per sample (CSV)
    #[arg(long)]
    pub features: PathBuf,

    /// [env: CONNECTOME_MIN_SPLIT_SAMPLES]
    #[arg(long)]
    pub min_split: Option<usize>,

    /// [env: CONNECTOME_MAX_DEPTH]
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// k-means++ restarts per fit
    #[arg(long, default_value = "10")]
    pub restarts: usize,

    /// [env: CONNECTOME_SEED]
    #[arg(long)]
    pub seed: Option<u64>,

    /// [env: CONNECTOME_PARALLEL]
    #[arg(long)]
    pub parallel: bool,

    /// Per-depth labels (CSV: sample, level_1..level_D, leaf)
    #[arg(long)]
    pub labels_out: PathBuf,

    /// Linkage table (CSV: left, right, distance, member_count)
    #[arg(long)]
    pub linkage_out: Option<PathBuf>,

    /// Leaf label per linkage leaf id (CSV)
    #[arg(long)]
    pub leaf_order_out: Option<PathBuf>,

    /// What a leaf counts for in `member_count`
    #[arg(long, value_enum, default_value = "leaves")]
    pub weight: Weight,

    /// Print the tree to stdout
    #[arg(long, value_enum)]
    pub print_tree: Option<PrintField>,

    /// Split audit (JSON)
    #[arg(long)]
    pub report: Option<PathBuf>,
}

// ─────────────────────────────────────────────
// Node lists
// ─────────────────────────────────────────────

/// Comma-separated node indices with inclusive ranges: `0,3,10-19`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeList(pub Vec<usize>);

impl FromStr for NodeList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut nodes = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('-') {
                Some((lo, hi)) => {
                    let lo: usize = lo.trim().parse().map_err(|_| format!("bad range start in '{part}'"))?;
                    let hi: usize = hi.trim().parse().map_err(|_| format!("bad range end in '{part}'"))?;
                    if hi < lo {
                        return Err(format!("empty range '{part}'"));
                    }
                    nodes.extend(lo..=hi);
                }
                None => nodes.push(part.parse().map_err(|_| format!("bad node index '{part}'"))?),
            }
        }
        Ok(Self(nodes))
    }
}
