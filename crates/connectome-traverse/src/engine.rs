//! Single-trajectory simulation: the [`Traversal`] capability, its
//! configuration, and the [`Trajectory`] it produces.
//!
//! Two policies implement [`Traversal`]:
//!
//! | Policy                        | Active set per hop | Probabilities used      |
//! |-------------------------------|--------------------|-------------------------|
//! | [`RandomWalk`](crate::RandomWalk) | one token      | row distribution        |
//! | [`Cascade`](crate::Cascade), simultaneous | many   | per-edge transmission   |
//! | [`Cascade`](crate::Cascade), sequential   | one    | per-edge transmission   |
//!
//! Every trajectory ends in exactly one [`Outcome`].

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TraverseError};
use crate::transition::TransitionModel;

// ─────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────

/// Why a trajectory stopped. Never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A stop node was reached.
    ReachedStop,
    /// No outgoing mass remained from the active node(s).
    DeadEnd,
    /// `max_hops` steps were taken without stopping.
    HopBudgetExceeded,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ReachedStop       => "reached_stop",
            Self::DeadEnd           => "dead_end",
            Self::HopBudgetExceeded => "hop_budget_exceeded",
        }
    }
}

// ─────────────────────────────────────────────
// Trajectory
// ─────────────────────────────────────────────

/// The record of one simulated trajectory.
///
/// `hops[0]` holds the source; `hops[h]` the nodes reached after `h` steps.
/// A random walk has exactly one node per hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trajectory {
    pub source:  usize,
    pub hops:    Vec<Vec<usize>>,
    pub outcome: Outcome,
}

impl Trajectory {
    /// Number of steps taken (hops after the source).
    pub fn steps(&self) -> usize {
        self.hops.len().saturating_sub(1)
    }

    /// Visited nodes flattened in visitation order, source first.
    pub fn path(&self) -> Vec<usize> {
        self.hops.iter().flatten().copied().collect()
    }

    /// Last node of the path, if any.
    pub fn last(&self) -> Option<usize> {
        self.hops.last().and_then(|h| h.last().copied())
    }

    /// `(step, node)` for every visit after the source; `step` is 1-based.
    pub fn visits(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.hops
            .iter()
            .enumerate()
            .skip(1)
            .flat_map(|(step, nodes)| nodes.iter().map(move |&n| (step, n)))
    }
}

// ─────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────

/// Stop conditions and policy switches shared by all traversals.
#[derive(Debug, Clone)]
pub struct TraverseConfig {
    /// Nodes that end a walk / absorb a cascade.
    pub stop_nodes:   Vec<usize>,
    /// Maximum number of steps after the source. Must be ≥ 1.
    pub max_hops:     usize,
    /// When `false`, already-visited nodes are never re-entered.
    pub allow_loops:  bool,
    /// Cascades only: fire every active node per hop (`true`) or advance a
    /// single token (`false`).
    pub simultaneous: bool,
}

impl Default for TraverseConfig {
    fn default() -> Self {
        Self {
            stop_nodes:   Vec::new(),
            max_hops:     10,
            allow_loops:  true,
            simultaneous: true,
        }
    }
}

/// A [`TraverseConfig`] checked against a model: stop nodes as a dense mask.
#[derive(Debug, Clone)]
pub(crate) struct Bounds {
    pub stop:         Vec<bool>,
    pub max_hops:     usize,
    pub allow_loops:  bool,
    pub simultaneous: bool,
}

impl Bounds {
    pub(crate) fn new(model: &TransitionModel, config: &TraverseConfig) -> Result<Self> {
        if config.max_hops == 0 {
            return Err(TraverseError::Configuration("max_hops must be at least 1".into()));
        }
        let mut stop = vec![false; model.n_nodes()];
        for &s in &config.stop_nodes {
            model.check_node(s)?;
            stop[s] = true;
        }
        Ok(Self {
            stop,
            max_hops:     config.max_hops,
            allow_loops:  config.allow_loops,
            simultaneous: config.simultaneous,
        })
    }

    #[inline]
    pub(crate) fn is_stop(&self, node: usize) -> bool {
        self.stop[node]
    }
}

// ─────────────────────────────────────────────
// Traversal capability
// ─────────────────────────────────────────────

/// A policy that simulates one trajectory from a source node.
///
/// Implementors are read-only with respect to their model, so a single
/// instance can be shared across worker threads; randomness always comes
/// from the injected `rng`.
pub trait Traversal: Sync {
    /// Number of nodes in the underlying graph.
    fn n_nodes(&self) -> usize;

    /// Maximum number of steps a trajectory may take.
    fn max_hops(&self) -> usize;

    /// Reject sources that cannot start a trajectory (out of range, or a
    /// stop node).
    fn check_source(&self, source: usize) -> Result<()>;

    /// Simulate one trajectory. `source` must already pass
    /// [`check_source`](Traversal::check_source).
    fn simulate<R: Rng + ?Sized>(&self, source: usize, rng: &mut R) -> Trajectory;

    /// Validate `source`, then simulate.
    fn start<R: Rng + ?Sized>(&self, source: usize, rng: &mut R) -> Result<Trajectory> {
        self.check_source(source)?;
        Ok(self.simulate(source, rng))
    }
}

pub(crate) fn check_source(model: &TransitionModel, bounds: &Bounds, source: usize) -> Result<()> {
    model.check_node(source)?;
    if bounds.is_stop(source) {
        return Err(TraverseError::Configuration(format!(
            "source node {source} is also a stop node"
        )));
    }
    Ok(())
}
