//! Subcommand drivers.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context};
use ndarray::{Array2, Axis};
use serde::Serialize;
use tracing::info;

use connectome_cluster::{
    level_labels, DivisiveClusterTree, KMeansBic, LinkageWeight, SplitRecord, TreeField,
};
use connectome_traverse::{
    to_markov_matrix, to_transmission_matrix, Cascade, DispatchConfig, MultistartReport,
    OutcomeCounts, PathCollection, RandomWalk, TransitionModel, TraverseConfig,
    TraverseDispatcher,
};

use crate::cli::{CascadeArgs, ClusterArgs, Collect, Direction, Mode, PrintField, Weight};
use crate::config::Config;
use crate::io;

// ─────────────────────────────────────────────
// cascade
// ─────────────────────────────────────────────

/// JSON summary of a `cascade` run.
#[derive(Debug, Clone, Serialize)]
pub struct CascadeSummary {
    pub mode:            &'static str,
    pub direction:       &'static str,
    pub n_nodes:         usize,
    pub dead_nodes:      usize,
    pub sources:         Vec<usize>,
    pub stops:           Vec<usize>,
    pub n_init:          usize,
    pub max_hops:        usize,
    pub seed:            u64,
    pub outcomes:        OutcomeCounts,
    pub histogram_total: u64,
    /// Per node: mean 1-based hop of its visits, `null` if never visited.
    pub mean_visit_hop:  Vec<Option<f64>>,
}

pub fn run_cascade(args: &CascadeArgs, config: &Config) -> anyhow::Result<CascadeSummary> {
    let adjacency = io::read_matrix_csv(&args.adjacency)?;

    let model = build_model(&adjacency, args.mode, args.p)?;
    let model = match args.direction {
        Direction::Forward  => model,
        Direction::Backward => model.transpose(),
    };

    let stops = args.stops.clone().unwrap_or_default().0;
    let traverse = TraverseConfig {
        stop_nodes:   stops.clone(),
        max_hops:     args.max_hops,
        allow_loops:  !args.no_loops,
        simultaneous: !args.sequential,
    };
    let dispatch = DispatchConfig {
        seed:     args.seed.unwrap_or(config.dispatch.seed),
        parallel: args.parallel || config.dispatch.parallel,
        collect:  match args.collect {
            Some(Collect::None)       => PathCollection::None,
            Some(Collect::Successful) => PathCollection::Successful,
            Some(Collect::All)        => PathCollection::All,
            None                      => config.dispatch.collect,
        },
        per_source: args.features_out.is_some(),
    };
    let n_init = args.n_init.unwrap_or(config.n_init);

    info!(
        mode      = ?args.mode,
        direction = ?args.direction,
        n_nodes   = model.n_nodes(),
        dead      = model.dead_nodes().len(),
        sources   = args.sources.0.len(),
        n_init,
        "starting cascade run"
    );

    let report = match args.mode {
        Mode::Walk => TraverseDispatcher::new(RandomWalk::new(&model, &traverse)?, dispatch.clone())
            .multistart(&args.sources.0, n_init)?,
        Mode::Cascade => TraverseDispatcher::new(Cascade::new(&model, &traverse)?, dispatch.clone())
            .multistart(&args.sources.0, n_init)?,
    };

    io::write_histogram_csv(&args.out, &report.histogram)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    if let Some(path) = &args.paths_out {
        io::write_paths_csv(path, &report.paths)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &args.features_out {
        io::write_matrix_csv(path, &source_features(&report, n_init)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    let summary = CascadeSummary {
        mode:            if args.mode == Mode::Walk { "walk" } else { "cascade" },
        direction:       if args.direction == Direction::Forward { "forward" } else { "backward" },
        n_nodes:         model.n_nodes(),
        dead_nodes:      model.dead_nodes().len(),
        sources:         args.sources.0.clone(),
        stops,
        n_init,
        max_hops:        args.max_hops,
        seed:            dispatch.seed,
        outcomes:        report.outcomes,
        histogram_total: report.histogram.total(),
        mean_visit_hop:  report.histogram.mean_visit_hop(),
    };
    if let Some(path) = &args.report {
        write_json(path, &summary)?;
    }
    Ok(summary)
}

/// One row per source: its histogram flattened hop-major, divided by `n_init`.
fn source_features(report: &MultistartReport, n_init: usize) -> anyhow::Result<Array2<f64>> {
    let width = report.histogram.max_hops() * report.histogram.n_nodes();
    let mut features = Array2::zeros((report.per_source.len(), width));
    for (mut row, histogram) in features.axis_iter_mut(Axis(0)).zip(&report.per_source) {
        let flat = (histogram.to_f64() / n_init.max(1) as f64)
            .into_shape(width)
            .map_err(|e| anyhow!("histogram reshape failed: {e}"))?;
        row.assign(&flat);
    }
    Ok(features)
}

fn build_model(adjacency: &Array2<f64>, mode: Mode, p: f64) -> anyhow::Result<TransitionModel> {
    Ok(match mode {
        Mode::Walk    => to_markov_matrix(adjacency)?,
        Mode::Cascade => to_transmission_matrix(adjacency, p)?,
    })
}

// ─────────────────────────────────────────────
// cluster
// ─────────────────────────────────────────────

/// JSON summary of a `cluster` run.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub n_samples:    usize,
    pub n_features:   usize,
    pub n_leaves:     usize,
    pub depth:        usize,
    pub linkage_rows: usize,
    pub splits:       Vec<SplitRecord>,
}

pub fn run_cluster(args: &ClusterArgs, config: &Config) -> anyhow::Result<ClusterSummary> {
    let x = io::read_matrix_csv(&args.features)?;

    let estimator = KMeansBic {
        n_init: args.restarts,
        seed:   args.seed.unwrap_or(config.dispatch.seed),
        ..KMeansBic::default()
    };
    let mut divisive = config.divisive.clone();
    if let Some(n) = args.min_split { divisive.min_split_samples = n; }
    if let Some(d) = args.max_depth { divisive.max_depth = Some(d); }
    divisive.parallel |= args.parallel;

    info!(
        samples   = x.nrows(),
        features  = x.ncols(),
        min_split = divisive.min_split_samples,
        max_depth = ?divisive.max_depth,
        "starting divisive clustering"
    );

    let mut tree = DivisiveClusterTree::new(estimator, divisive);
    tree.fit(x.view())?;

    let leaves = tree.fitted_labels()?;
    let columns = level_labels(&leaves, tree.depth());
    io::write_labels_csv(&args.labels_out, &leaves, &columns)
        .with_context(|| format!("failed to write {}", args.labels_out.display()))?;

    let weight = match args.weight {
        Weight::Leaves  => LinkageWeight::Leaves,
        Weight::Samples => LinkageWeight::Samples,
    };
    let linkage = tree.build_linkage_weighted(weight)?;
    if let Some(path) = &args.linkage_out {
        io::write_linkage_csv(path, &linkage)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &args.leaf_order_out {
        io::write_leaf_order_csv(path, &linkage)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if let Some(field) = args.print_tree {
        let field = match field {
            PrintField::Samples => TreeField::Samples,
            PrintField::Bic     => TreeField::BicRatio,
        };
        print!("{}", tree.render(field));
    }

    let summary = ClusterSummary {
        n_samples:    x.nrows(),
        n_features:   x.ncols(),
        n_leaves:     tree.n_leaves(),
        depth:        tree.depth(),
        linkage_rows: linkage.rows.len(),
        splits:       tree.split_report(),
    };
    if let Some(path) = &args.report {
        write_json(path, &summary)?;
    }
    Ok(summary)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
