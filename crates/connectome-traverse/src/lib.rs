//! # connectome-traverse
//!
//! Stochastic traversal of a weighted directed connectome.
//!
//! Simulates random walks and spreading-activation cascades from source
//! nodes and aggregates many independent trajectories into per-node, per-hop
//! visitation counts.
//!
//! ## Crate structure
//!
//! | Module         | Responsibility                                             |
//! |----------------|------------------------------------------------------------|
//! | [`transition`] | [`TransitionModel`] — Markov / transmission probabilities  |
//! | [`engine`]     | [`Traversal`] capability, [`Trajectory`], [`Outcome`]      |
//! | [`walk`]       | [`RandomWalk`]                                             |
//! | [`cascade`]    | [`Cascade`] (simultaneous or sequential)                   |
//! | [`dispatch`]   | [`TraverseDispatcher`] — multistart + aggregation          |
//! | [`histogram`]  | [`HopHistogram`] `(max_hops, n_nodes)`                     |
//! | [`paths`]      | indicator matrices and path graphs for collected paths     |
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use connectome_traverse::*;
//!
//! let model = to_transmission_matrix(&adj, 0.05)?;
//! let cfg = TraverseConfig { stop_nodes: outputs, max_hops: 10, allow_loops: false, ..Default::default() };
//! let td = TraverseDispatcher::new(Cascade::new(&model, &cfg)?, DispatchConfig::default());
//!
//! let forward = td.multistart(&sources, 100)?;
//! println!("{:?}", forward.outcomes);
//!
//! // upstream reachability: same engine on reversed edges
//! let back_model = model.transpose();
//! ```

pub mod cascade;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod histogram;
pub mod paths;
pub mod transition;
pub mod walk;

pub use cascade::Cascade;
pub use dispatch::{
    trial_rng, DispatchConfig, MultistartReport, OutcomeCounts, PathCollection, TraverseDispatcher,
};
pub use engine::{Outcome, Trajectory, Traversal, TraverseConfig};
pub use error::{Result, TraverseError};
pub use histogram::HopHistogram;
pub use paths::{path_graph, path_indicator_matrix, paths_by_length};
pub use transition::{to_markov_matrix, to_transmission_matrix, ModelKind, TransitionModel};
pub use walk::RandomWalk;
