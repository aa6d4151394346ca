//! Many-trajectory orchestration and aggregation.
//!
//! ## Reproducibility contract
//!
//! Trials are enumerated as `unit = s * n_init + t` for source position `s`
//! and trial `t`. Each unit draws from its own generator:
//!
//! ```text
//! ChaCha8Rng::seed_from_u64(seed) with stream = unit
//! ```
//!
//! Histogram cells are integer sums and collected paths are re-ordered by
//! unit, so a fixed seed yields identical reports whether trials run
//! serially or across any number of rayon workers.

use std::str::FromStr;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::{Outcome, Trajectory, Traversal};
use crate::error::Result;
use crate::histogram::HopHistogram;

// ─────────────────────────────────────────────
// Outcome counters
// ─────────────────────────────────────────────

/// Aggregate termination reasons over a batch of trajectories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub reached_stop:        u64,
    pub dead_end:            u64,
    pub hop_budget_exceeded: u64,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::ReachedStop       => self.reached_stop += 1,
            Outcome::DeadEnd           => self.dead_end += 1,
            Outcome::HopBudgetExceeded => self.hop_budget_exceeded += 1,
        }
    }

    pub fn merge(&mut self, other: &OutcomeCounts) {
        self.reached_stop        += other.reached_stop;
        self.dead_end            += other.dead_end;
        self.hop_budget_exceeded += other.hop_budget_exceeded;
    }

    pub fn total(&self) -> u64 {
        self.reached_stop + self.dead_end + self.hop_budget_exceeded
    }

    pub fn get(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::ReachedStop       => self.reached_stop,
            Outcome::DeadEnd           => self.dead_end,
            Outcome::HopBudgetExceeded => self.hop_budget_exceeded,
        }
    }

    /// Share of trajectories that ended with `outcome`; 0.0 for an empty batch.
    pub fn fraction(&self, outcome: Outcome) -> f64 {
        let total = self.total();
        if total == 0 { 0.0 } else { self.get(outcome) as f64 / total as f64 }
    }
}

// ─────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────

/// Which trajectories a [`MultistartReport`] keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCollection {
    /// Histogram and counters only.
    #[default]
    None,
    /// Trajectories that reached a stop node.
    Successful,
    /// Every trajectory, including dead ends and truncations.
    All,
}

impl PathCollection {
    fn keeps(self, outcome: Outcome) -> bool {
        match self {
            Self::None       => false,
            Self::Successful => outcome == Outcome::ReachedStop,
            Self::All        => true,
        }
    }

}

impl FromStr for PathCollection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none"       => Ok(Self::None),
            "successful" => Ok(Self::Successful),
            "all"        => Ok(Self::All),
            other        => Err(format!("unknown path collection '{other}'")),
        }
    }
}

/// Tuning parameters for [`TraverseDispatcher`].
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Base seed of the per-trial generator streams.
    pub seed:     u64,
    /// Run trials on the rayon pool.
    pub parallel: bool,
    /// Trajectories to retain in the report.
    pub collect:  PathCollection,
    /// Also keep one histogram per source position.
    pub per_source: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { seed: 888, parallel: false, collect: PathCollection::None, per_source: false }
    }
}

impl DispatchConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("CONNECTOME_SEED") {
            if let Ok(n) = v.parse() { cfg.seed = n; }
        }
        if let Ok(v) = std::env::var("CONNECTOME_PARALLEL") {
            cfg.parallel = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("CONNECTOME_COLLECT_PATHS") {
            if let Ok(c) = v.parse() { cfg.collect = c; }
        }
        cfg
    }
}

/// Generator for trial `unit` under base `seed` (see module docs).
pub fn trial_rng(seed: u64, unit: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(unit);
    rng
}

// ─────────────────────────────────────────────
// Report
// ─────────────────────────────────────────────

/// Aggregated result of one [`TraverseDispatcher::multistart`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct MultistartReport {
    pub histogram: HopHistogram,
    pub outcomes:  OutcomeCounts,
    /// Retained trajectories ordered by `(source position, trial)`.
    pub paths:     Vec<Trajectory>,
    /// One histogram per source position when [`DispatchConfig::per_source`]
    /// is set, empty otherwise. They sum to `histogram`.
    pub per_source: Vec<HopHistogram>,
}

/// Per-worker private accumulator.
struct Partial {
    histogram:  HopHistogram,
    outcomes:   OutcomeCounts,
    paths:      Vec<(usize, Trajectory)>,
    per_source: Vec<HopHistogram>,
}

impl Partial {
    fn new(max_hops: usize, n_nodes: usize, n_sources: usize) -> Self {
        Self {
            histogram:  HopHistogram::new(max_hops, n_nodes),
            outcomes:   OutcomeCounts::default(),
            paths:      Vec::new(),
            per_source: vec![HopHistogram::new(max_hops, n_nodes); n_sources],
        }
    }

    fn absorb(&mut self, unit: usize, position: usize, trajectory: Trajectory, collect: PathCollection) {
        self.histogram.record(&trajectory);
        if let Some(h) = self.per_source.get_mut(position) {
            h.record(&trajectory);
        }
        self.outcomes.record(trajectory.outcome);
        if collect.keeps(trajectory.outcome) {
            self.paths.push((unit, trajectory));
        }
    }

    fn merge(mut self, other: Partial) -> Partial {
        self.histogram.merge(&other.histogram);
        self.outcomes.merge(&other.outcomes);
        self.paths.extend(other.paths);
        for (mine, theirs) in self.per_source.iter_mut().zip(&other.per_source) {
            mine.merge(theirs);
        }
        self
    }
}

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

/// Runs many independent trajectories of one [`Traversal`] and aggregates
/// them into a [`HopHistogram`].
#[derive(Debug, Clone)]
pub struct TraverseDispatcher<T> {
    traversal: T,
    config:    DispatchConfig,
}

impl<T: Traversal> TraverseDispatcher<T> {
    pub fn new(traversal: T, config: DispatchConfig) -> Self {
        Self { traversal, config }
    }

    pub fn traversal(&self) -> &T { &self.traversal }
    pub fn config(&self) -> &DispatchConfig { &self.config }

    /// `n_init` trajectories from a single source.
    pub fn start(&self, source: usize, n_init: usize) -> Result<MultistartReport> {
        self.multistart(&[source], n_init)
    }

    /// `n_init` independent trajectories from every node of `sources`.
    ///
    /// Every source is validated before any simulation runs. An empty
    /// `sources` slice yields an all-zero histogram.
    pub fn multistart(&self, sources: &[usize], n_init: usize) -> Result<MultistartReport> {
        for &s in sources {
            self.traversal.check_source(s)?;
        }

        let max_hops = self.traversal.max_hops();
        let n_nodes  = self.traversal.n_nodes();
        let units    = sources.len() * n_init;
        let seed     = self.config.seed;
        let collect  = self.config.collect;
        let slots    = if self.config.per_source { sources.len() } else { 0 };

        let run = |mut acc: Partial, unit: usize| {
            let position = unit / n_init;
            let mut rng = trial_rng(seed, unit as u64);
            let trajectory = self.traversal.simulate(sources[position], &mut rng);
            acc.absorb(unit, position, trajectory, collect);
            acc
        };

        let partial = if self.config.parallel {
            (0..units)
                .into_par_iter()
                .fold(|| Partial::new(max_hops, n_nodes, slots), run)
                .reduce(|| Partial::new(max_hops, n_nodes, slots), Partial::merge)
        } else {
            (0..units).fold(Partial::new(max_hops, n_nodes, slots), run)
        };

        let Partial { histogram, outcomes, mut paths, per_source } = partial;
        paths.sort_unstable_by_key(|(unit, _)| *unit);

        tracing::info!(
            sources        = sources.len(),
            n_init,
            reached_stop   = outcomes.reached_stop,
            dead_end       = outcomes.dead_end,
            budget_spent   = outcomes.hop_budget_exceeded,
            stop_fraction  = outcomes.fraction(Outcome::ReachedStop),
            "multistart complete"
        );

        Ok(MultistartReport {
            histogram,
            outcomes,
            paths: paths.into_iter().map(|(_, t)| t).collect(),
            per_source,
        })
    }
}
