//! Probabilistic spreading activation.
//!
//! Entries of the model are read as independent per-edge firing
//! probabilities (see [`to_transmission_matrix`](crate::to_transmission_matrix)).
//!
//! ## Simultaneous mode
//!
//! Every node of the active frontier fires independently onto each of its
//! neighbours; all newly activated nodes form the next hop. Stop nodes are
//! absorbing: they are recorded on activation but never propagate. The
//! cascade ends when the frontier is empty, or when `max_hops` steps have
//! been taken with a non-empty frontier. Either way it counts as
//! `ReachedStop` once any stop node has been activated.
//!
//! ## Sequential mode
//!
//! A single active node advances per hop, like a random walk: its
//! neighbours fire independently and one of the fired neighbours is picked
//! uniformly. If none fires, the cascade has nowhere to go and ends as a
//! dead end.

use rand::Rng;

use crate::engine::{check_source, Bounds, Outcome, Trajectory, Traversal, TraverseConfig};
use crate::error::Result;
use crate::transition::TransitionModel;

/// Cascade over a transmission-probability model.
#[derive(Debug, Clone)]
pub struct Cascade<'m> {
    model:  &'m TransitionModel,
    bounds: Bounds,
}

impl<'m> Cascade<'m> {
    pub fn new(model: &'m TransitionModel, config: &TraverseConfig) -> Result<Self> {
        let bounds = Bounds::new(model, config)?;
        Ok(Self { model, bounds })
    }

    fn simulate_simultaneous<R: Rng + ?Sized>(&self, source: usize, rng: &mut R) -> Trajectory {
        let n = self.model.n_nodes();
        let mut visited = vec![false; n];
        visited[source] = true;

        let mut hops         = vec![vec![source]];
        let mut frontier     = vec![source];
        let mut reached_stop = false;
        let mut fired        = vec![false; n];

        let outcome = loop {
            if frontier.is_empty() {
                break if reached_stop { Outcome::ReachedStop } else { Outcome::DeadEnd };
            }
            if hops.len() > self.bounds.max_hops {
                break if reached_stop { Outcome::ReachedStop } else { Outcome::HopBudgetExceeded };
            }

            let mut activated = Vec::new();
            for &i in &frontier {
                for (j, &p) in self.model.row(i).iter().enumerate() {
                    if p <= 0.0 || fired[j] || (!self.bounds.allow_loops && visited[j]) {
                        continue;
                    }
                    if rng.gen_bool(p) {
                        fired[j] = true;
                        activated.push(j);
                    }
                }
            }
            activated.sort_unstable();

            frontier.clear();
            for &j in &activated {
                fired[j]   = false;
                visited[j] = true;
                if self.bounds.is_stop(j) {
                    reached_stop = true;
                } else {
                    frontier.push(j);
                }
            }
            if !activated.is_empty() {
                hops.push(activated);
            }
        };

        Trajectory { source, hops, outcome }
    }

    fn simulate_sequential<R: Rng + ?Sized>(&self, source: usize, rng: &mut R) -> Trajectory {
        let mut visited = vec![false; self.model.n_nodes()];
        visited[source] = true;

        let mut hops    = vec![vec![source]];
        let mut current = source;

        let outcome = loop {
            if self.bounds.is_stop(current) {
                break Outcome::ReachedStop;
            }
            if self.model.is_dead(current) {
                break Outcome::DeadEnd;
            }
            if hops.len() > self.bounds.max_hops {
                break Outcome::HopBudgetExceeded;
            }

            let fired: Vec<usize> = self
                .model
                .row(current)
                .iter()
                .enumerate()
                .filter(|&(j, &p)| p > 0.0 && (self.bounds.allow_loops || !visited[j]))
                .filter(|&(_, &p)| rng.gen_bool(p))
                .map(|(j, _)| j)
                .collect();

            if fired.is_empty() {
                break Outcome::DeadEnd;
            }
            let next = fired[rng.gen_range(0..fired.len())];

            visited[next] = true;
            hops.push(vec![next]);
            current = next;
        };

        Trajectory { source, hops, outcome }
    }
}

impl Traversal for Cascade<'_> {
    fn n_nodes(&self) -> usize { self.model.n_nodes() }
    fn max_hops(&self) -> usize { self.bounds.max_hops }

    fn check_source(&self, source: usize) -> Result<()> {
        check_source(self.model, &self.bounds, source)
    }

    fn simulate<R: Rng + ?Sized>(&self, source: usize, rng: &mut R) -> Trajectory {
        if self.bounds.simultaneous {
            self.simulate_simultaneous(source, rng)
        } else {
            self.simulate_sequential(source, rng)
        }
    }
}
