//! Single-token random walk.
//!
//! At each step the next node is sampled from the current node's row of the
//! transition model. With `allow_loops = false` the already-visited nodes
//! are removed from the candidate set and the remaining mass renormalized;
//! if nothing remains the walk is a dead end.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::engine::{check_source, Bounds, Outcome, Trajectory, Traversal, TraverseConfig};
use crate::error::Result;
use crate::transition::TransitionModel;

/// Random walk over a [`TransitionModel`].
#[derive(Debug, Clone)]
pub struct RandomWalk<'m> {
    model:  &'m TransitionModel,
    bounds: Bounds,
}

impl<'m> RandomWalk<'m> {
    pub fn new(model: &'m TransitionModel, config: &TraverseConfig) -> Result<Self> {
        let bounds = Bounds::new(model, config)?;
        Ok(Self { model, bounds })
    }
}

impl Traversal for RandomWalk<'_> {
    fn n_nodes(&self) -> usize { self.model.n_nodes() }
    fn max_hops(&self) -> usize { self.bounds.max_hops }

    fn check_source(&self, source: usize) -> Result<()> {
        check_source(self.model, &self.bounds, source)
    }

    fn simulate<R: Rng + ?Sized>(&self, source: usize, rng: &mut R) -> Trajectory {
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

            let row = self.model.row(current);
            let candidates = row
                .iter()
                .enumerate()
                .filter(|&(j, &w)| w > 0.0 && (self.bounds.allow_loops || !visited[j]))
                .map(|(j, &w)| (j, w));

            let Some(next) = weighted_choice(candidates, rng) else {
                break Outcome::DeadEnd;
            };

            visited[next] = true;
            hops.push(vec![next]);
            current = next;
        };

        Trajectory { source, hops, outcome }
    }
}

/// Sample one index proportionally to its weight.
///
/// Returns `None` when there is no positive, finite mass to sample from.
pub(crate) fn weighted_choice<R, I>(candidates: I, rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
    I: Iterator<Item = (usize, f64)>,
{
    let (ids, weights): (Vec<usize>, Vec<f64>) = candidates.unzip();
    if ids.is_empty() {
        return None;
    }
    let sampler = WeightedIndex::new(&weights).ok()?;
    Some(ids[sampler.sample(rng)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::to_markov_matrix;
    use ndarray::{array, Array2};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    // ── helpers ──────────────────────────────────────────

    fn rng() -> ChaCha8Rng { ChaCha8Rng::seed_from_u64(42) }

    /// Dense random-ish digraph with a few dead nodes.
    fn tangled(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, n), |(i, j)| {
            if i % 7 == 3 || i == j { 0.0 } else { ((i * 31 + j * 17) % 5) as f64 }
        })
    }

    // ── tests ────────────────────────────────────────────

    #[test]
    fn walk_from_dead_node_stops_immediately() {
        // A → B, C → A, B has no outgoing edges
        let adj = array![[0.0, 1.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let model = to_markov_matrix(&adj).unwrap();
        let walk = RandomWalk::new(&model, &TraverseConfig::default()).unwrap();

        let t = walk.start(1, &mut rng()).unwrap();
        assert_eq!(t.path(), vec![1]);
        assert_eq!(t.outcome, Outcome::DeadEnd);
        assert_eq!(t.steps(), 0);
    }

    #[test]
    fn walk_stops_at_stop_node() {
        let adj = array![[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]];
        let model = to_markov_matrix(&adj).unwrap();
        let cfg = TraverseConfig { stop_nodes: vec![2], ..Default::default() };
        let walk = RandomWalk::new(&model, &cfg).unwrap();

        let t = walk.start(0, &mut rng()).unwrap();
        assert_eq!(t.path(), vec![0, 1, 2]);
        assert_eq!(t.outcome, Outcome::ReachedStop);
    }

    #[test]
    fn walk_respects_hop_budget() {
        let adj = array![[0.0, 1.0], [1.0, 0.0]];
        let model = to_markov_matrix(&adj).unwrap();
        let cfg = TraverseConfig { max_hops: 5, ..Default::default() };
        let walk = RandomWalk::new(&model, &cfg).unwrap();

        let t = walk.start(0, &mut rng()).unwrap();
        assert_eq!(t.path(), vec![0, 1, 0, 1, 0, 1]);
        assert_eq!(t.outcome, Outcome::HopBudgetExceeded);
    }

    #[test]
    fn loop_free_walk_never_revisits() {
        let model = to_markov_matrix(&tangled(40)).unwrap();
        let cfg = TraverseConfig { max_hops: 30, allow_loops: false, ..Default::default() };
        let walk = RandomWalk::new(&model, &cfg).unwrap();
        let mut rng = rng();

        for source in (0..40).filter(|s| s % 7 != 3) {
            for _ in 0..20 {
                let path = walk.start(source, &mut rng).unwrap().path();
                let unique: HashSet<usize> = path.iter().copied().collect();
                assert_eq!(unique.len(), path.len(), "revisit in {path:?}");
            }
        }
    }

    #[test]
    fn loop_free_walk_on_exhausted_cycle_is_dead_end() {
        let adj = array![[0.0, 1.0], [1.0, 0.0]];
        let model = to_markov_matrix(&adj).unwrap();
        let cfg = TraverseConfig { allow_loops: false, ..Default::default() };
        let walk = RandomWalk::new(&model, &cfg).unwrap();

        let t = walk.start(0, &mut rng()).unwrap();
        assert_eq!(t.path(), vec![0, 1]);
        assert_eq!(t.outcome, Outcome::DeadEnd);
    }

    #[test]
    fn same_seed_same_walk() {
        let model = to_markov_matrix(&tangled(25)).unwrap();
        let walk = RandomWalk::new(&model, &TraverseConfig::default()).unwrap();

        let a = walk.start(0, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        let b = walk.start(0, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn weighted_choice_handles_empty_and_zero_mass() {
        let mut r = rng();
        assert_eq!(weighted_choice(std::iter::empty(), &mut r), None);
        assert_eq!(weighted_choice(vec![(3, 0.0)].into_iter(), &mut r), None);
        assert_eq!(weighted_choice(vec![(3, 2.0)].into_iter(), &mut r), Some(3));
    }
}
