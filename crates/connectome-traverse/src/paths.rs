//! Post-processing of collected paths.

use std::collections::{BTreeMap, HashMap};

use ndarray::Array2;

/// `(n_paths, n_nodes)` matrix of 1-based visit positions.
///
/// Entry `[i, v]` is the position of node `v` in path `i` (1 = first), or 0
/// when the path never visits `v`. A node visited more than once keeps its
/// last position. Nodes `>= n_nodes` are ignored.
pub fn path_indicator_matrix(paths: &[Vec<usize>], n_nodes: usize) -> Array2<u32> {
    let mut m = Array2::zeros((paths.len(), n_nodes));
    for (i, path) in paths.iter().enumerate() {
        for (pos, &v) in path.iter().enumerate() {
            if v < n_nodes {
                m[[i, v]] = pos as u32 + 1;
            }
        }
    }
    m
}

/// Bucket paths by their number of visited nodes.
pub fn paths_by_length(paths: &[Vec<usize>]) -> BTreeMap<usize, Vec<&[usize]>> {
    let mut buckets: BTreeMap<usize, Vec<&[usize]>> = BTreeMap::new();
    for p in paths {
        buckets.entry(p.len()).or_default().push(p.as_slice());
    }
    buckets
}

/// Multiset of consecutive transitions `(u, v)` across all paths.
pub fn path_graph(paths: &[Vec<usize>]) -> HashMap<(usize, usize), u64> {
    let mut edges: HashMap<(usize, usize), u64> = HashMap::new();
    for p in paths {
        for w in p.windows(2) {
            *edges.entry((w[0], w[1])).or_default() += 1;
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_marks_visit_positions() {
        let paths = vec![vec![2, 0, 1], vec![1]];
        let m = path_indicator_matrix(&paths, 3);

        assert_eq!(m.row(0).to_vec(), vec![2, 3, 1]);
        assert_eq!(m.row(1).to_vec(), vec![0, 1, 0]);
    }

    #[test]
    fn buckets_by_length() {
        let paths = vec![vec![0, 1], vec![2], vec![1, 2]];
        let b = paths_by_length(&paths);

        assert_eq!(b[&2].len(), 2);
        assert_eq!(b[&1], vec![&[2usize][..]]);
    }

    #[test]
    fn path_graph_counts_transitions() {
        let paths = vec![vec![0, 1, 2], vec![0, 1], vec![3]];
        let g = path_graph(&paths);

        assert_eq!(g[&(0, 1)], 2);
        assert_eq!(g[&(1, 2)], 1);
        assert_eq!(g.len(), 2);
    }
}
