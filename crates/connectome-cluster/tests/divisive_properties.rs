//! End-to-end behaviour of the divisive tree with the bundled estimator.

use std::collections::HashSet;

use connectome_cluster::{
    level_labels, BranchPath, ClusterError, DivisiveClusterTree, DivisiveConfig, KMeansBic,
    LinkageWeight, NodeState,
};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ── helpers ──────────────────────────────────────────────────────────────────

/// Uniform square blobs of side 1 around each center, concatenated in order.
fn blobs(centers: &[[f64; 2]], per_blob: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut flat = Vec::with_capacity(centers.len() * per_blob * 2);
    for c in centers {
        for _ in 0..per_blob {
            flat.push(c[0] + rng.gen_range(-0.5..0.5));
            flat.push(c[1] + rng.gen_range(-0.5..0.5));
        }
    }
    Array2::from_shape_vec((centers.len() * per_blob, 2), flat).unwrap()
}

/// Isotropic unit-variance Gaussian blobs (Box–Muller), concatenated in order.
fn gaussian_blobs(centers: &[[f64; 2]], per_blob: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut flat = Vec::with_capacity(centers.len() * per_blob * 2);
    for c in centers {
        for _ in 0..per_blob {
            let r = (-2.0 * (1.0 - rng.gen::<f64>()).ln()).sqrt();
            let theta = 2.0 * std::f64::consts::PI * rng.gen::<f64>();
            flat.push(c[0] + r * theta.cos());
            flat.push(c[1] + r * theta.sin());
        }
    }
    Array2::from_shape_vec((centers.len() * per_blob, 2), flat).unwrap()
}

fn fitted(x: &Array2<f64>, min_split: usize) -> DivisiveClusterTree<KMeansBic> {
    let mut tree = DivisiveClusterTree::new(
        KMeansBic::default(),
        DivisiveConfig { min_split_samples: min_split, ..Default::default() },
    );
    tree.fit(x.view()).unwrap();
    tree
}

// ── two blobs ────────────────────────────────────────────────────────────────

#[test]
fn two_blobs_give_a_depth_one_tree() {
    let x = blobs(&[[0.0, 0.0], [10.0, 10.0]], 50, 7);
    let tree = fitted(&x, 5);

    assert_eq!(tree.depth(), 1);
    assert_eq!(tree.n_leaves(), 2);

    let labels = tree.fitted_labels().unwrap();
    assert!(labels[..50].iter().all(|l| *l == labels[0]));
    assert!(labels[50..].iter().all(|l| *l == labels[50]));
    assert_ne!(labels[0], labels[50]);
    assert_eq!(labels[0].depth(), 1);
}

#[test]
fn two_blobs_link_once_at_distance_one() {
    let x = blobs(&[[0.0, 0.0], [10.0, 10.0]], 50, 7);
    let tree = fitted(&x, 5);

    let by_leaf = tree.build_linkage().unwrap();
    assert_eq!(by_leaf.rows.len(), 1);
    assert_eq!(by_leaf.rows[0].left, 0);
    assert_eq!(by_leaf.rows[0].right, 1);
    assert_eq!(by_leaf.rows[0].distance, 1.0);
    assert_eq!(by_leaf.rows[0].member_count, 2);
    assert_eq!(by_leaf.leaf_labels.len(), 2);

    let by_samples = tree.build_linkage_weighted(LinkageWeight::Samples).unwrap();
    assert_eq!(by_samples.rows[0].member_count, 100);
}

#[test]
fn two_gaussian_blobs_split_once_into_a_partition() {
    let x = gaussian_blobs(&[[0.0, 0.0], [10.0, 10.0]], 100, 21);
    let tree = fitted(&x, 5);

    assert_eq!(tree.depth(), 1);
    assert_eq!(tree.n_leaves(), 2);
    assert!(tree.nodes()[0].bic_ratio().unwrap() < 1.0);

    let labels = tree.fitted_labels().unwrap();
    assert!(labels[..100].iter().all(|l| *l == labels[0]));
    assert!(labels[100..].iter().all(|l| *l == labels[100]));
    assert_ne!(labels[0], labels[100]);

    let mut covered = vec![0u32; 200];
    for leaf in tree.leaves() {
        assert_eq!(leaf.samples().len(), 100);
        for &s in leaf.samples() {
            covered[s] += 1;
        }
    }
    assert!(covered.iter().all(|&c| c == 1));
}

// ── structural invariants ────────────────────────────────────────────────────

#[test]
fn children_partition_their_parent() {
    let x = blobs(&[[0.0, 0.0], [12.0, 0.0], [0.0, 12.0], [12.0, 12.0]], 50, 11);
    let tree = fitted(&x, 10);

    for node in tree.nodes() {
        assert_ne!(node.state(), NodeState::Unfit);
        assert_eq!(node.is_leaf(), node.children().is_none());

        if let Some([l, r]) = node.children() {
            let left: HashSet<usize>  = tree.nodes()[l].samples().iter().copied().collect();
            let right: HashSet<usize> = tree.nodes()[r].samples().iter().copied().collect();
            let parent: HashSet<usize> = node.samples().iter().copied().collect();

            assert!(left.is_disjoint(&right));
            assert_eq!(&left | &right, parent);
            assert!(!left.is_empty() && !right.is_empty());
        }
    }

    let mut covered = vec![0u32; 200];
    for leaf in tree.leaves() {
        for &s in leaf.samples() {
            covered[s] += 1;
        }
    }
    assert!(covered.iter().all(|&c| c == 1));
}

#[test]
fn linkage_rows_are_topologically_ordered() {
    let x = blobs(&[[0.0, 0.0], [12.0, 0.0], [0.0, 12.0], [12.0, 12.0]], 50, 11);
    let tree = fitted(&x, 10);

    let linkage = tree.build_linkage().unwrap();
    let internal = tree.nodes().iter().filter(|n| n.state() == NodeState::Internal).count();
    let n_leaves = tree.n_leaves();

    assert_eq!(linkage.rows.len(), internal);
    assert_eq!(linkage.leaf_labels.len(), n_leaves);
    for (k, row) in linkage.rows.iter().enumerate() {
        assert!(row.left < n_leaves + k);
        assert!(row.right < n_leaves + k);
        assert!(row.distance >= 1.0);
    }
    assert_eq!(linkage.rows.last().unwrap().member_count, n_leaves);

    let weighted = tree.build_linkage_weighted(LinkageWeight::Samples).unwrap();
    assert_eq!(weighted.rows.last().unwrap().member_count, 200);
}

// ── prediction ───────────────────────────────────────────────────────────────

#[test]
fn predict_returns_labels_of_mixed_depth() {
    // A and B close together, C far away: root splits {A, B} | C, then A | B
    let x = blobs(&[[0.0, 0.0], [3.0, 0.0], [30.0, 30.0]], 40, 3);
    let tree = fitted(&x, 5);

    let labels = tree.predict(x.view()).unwrap();
    let depths: HashSet<usize> = labels.iter().map(BranchPath::depth).collect();
    assert_eq!(depths, HashSet::from([1, 2]));
    assert_eq!(labels[0].depth(), 2);
    assert_eq!(labels[40].depth(), 2);
    assert_eq!(labels[80].depth(), 1);
    assert_eq!(labels[0].prefix(1), labels[40].prefix(1));

    let fresh = Array2::from_shape_vec((3, 2), vec![0.1, -0.1, 2.9, 0.2, 29.8, 30.1]).unwrap();
    let predicted = tree.predict(fresh.view()).unwrap();
    assert_eq!(predicted, vec![labels[0].clone(), labels[40].clone(), labels[80].clone()]);

    let columns = level_labels(&predicted, 2);
    assert_eq!(columns[0][0], columns[0][1]);
    assert_eq!(columns[1][2], labels[80]);
}

#[test]
fn predict_rejects_empty_input() {
    let x = blobs(&[[0.0, 0.0], [10.0, 10.0]], 20, 5);
    let tree = fitted(&x, 5);

    let err = tree.predict(Array2::<f64>::zeros((0, 2)).view()).unwrap_err();
    assert!(matches!(err, ClusterError::DegenerateInput(_)));
}

#[test]
fn split_report_covers_every_node() {
    let x = blobs(&[[0.0, 0.0], [10.0, 10.0]], 50, 7);
    let tree = fitted(&x, 5);

    let report = tree.split_report();
    assert_eq!(report.len(), tree.nodes().len());
    assert_eq!(report[0].n_samples, 100);
    assert!(report[0].bic_ratio.is_some());
    // 50-sample leaves were offered a split and declined it
    assert!(report[1..].iter().all(|r| r.state == NodeState::Leaf && r.bic_ratio.is_some()));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json[0]["state"], "internal");
}
