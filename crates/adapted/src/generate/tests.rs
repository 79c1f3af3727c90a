use proptest::prelude::*;

use super::*;
use crate::distance::adapted_wasserstein;

#[test]
fn coin_toss_tree_probabilities_and_values() {
    let t = coin_toss_tree(2, 0.8);
    let leaves = t.leaves();
    assert_eq!(leaves.len(), 4);
    let labels: Vec<&str> = leaves.iter().map(|&id| t.node(id).label.as_str()).collect();
    assert_eq!(labels, vec!["s00", "s01", "s10", "s11"]);
    let p: Vec<f64> = leaves.iter().map(|&id| t.node(id).p).collect();
    let expected = [0.04, 0.16, 0.16, 0.64];
    for (a, b) in p.iter().zip(expected) {
        assert!((a - b).abs() < 1e-12);
    }
    assert_eq!(t.path(leaves[3]), vec![0.0, 1.0, 2.0]);
}

#[test]
fn standard_filtration_mirrors_tree_shape() {
    let t = coin_toss_tree(3, 0.5);
    let f = standard_filtration(&t);
    assert_eq!(f.len(), t.len());
    assert_eq!(f.height(), 3);
    assert!(f.validate(8).is_ok());
    let leaves: Vec<Vec<usize>> = f.leaves().into_iter().map(|id| f.node(id).subset.clone()).collect();
    assert_eq!(leaves, (0..8).map(|i| vec![i]).collect::<Vec<_>>());
    let first = f.node(f.node(f.root()).children[0]);
    assert_eq!(first.subset, vec![0, 1, 2, 3]);
    assert_eq!(first.label, "s0");
}

#[test]
fn pull_up_moves_split_one_level_earlier() {
    let f = standard_filtration(&possible_limit());
    let center = f.node(f.root()).children[0];
    let pulled = pull_up_children(&f, center).unwrap();
    assert!(pulled.validate(2).is_ok());
    assert_eq!(pulled.height(), 2);
    let depth1: Vec<(String, Vec<usize>)> = pulled
        .nodes_at_depth(1)
        .into_iter()
        .map(|id| (pulled.node(id).label.clone(), pulled.node(id).subset.clone()))
        .collect();
    assert_eq!(
        depth1,
        vec![
            ("center#up".to_string(), vec![0]),
            ("center#down".to_string(), vec![1])
        ]
    );
}

#[test]
fn pull_up_appends_new_cells_after_remaining_siblings() {
    let f = standard_filtration(&coin_toss_tree(2, 0.5));
    let s0 = f.node(f.root()).children[0];
    let pulled = pull_up_children(&f, s0).unwrap();
    let labels: Vec<&str> = pulled
        .node(pulled.root())
        .children
        .iter()
        .map(|&id| pulled.node(id).label.as_str())
        .collect();
    assert_eq!(labels, vec!["s1", "s0#s00", "s0#s01"]);
    assert!(pulled.validate(4).is_ok());
}

#[test]
fn pull_up_of_root_is_rejected() {
    let f = standard_filtration(&possible_limit());
    assert!(pull_up_children(&f, f.root()).is_err());
}

#[test]
fn pull_up_of_unknown_node_is_an_error() {
    let f = standard_filtration(&coin_toss_tree(2, 0.5));
    let err = pull_up_children(&f, NodeId(f.len())).unwrap_err();
    assert!(err.to_string().contains("not in a filtration of 7 cells"), "{err}");
    assert!(pull_up_children(&f, NodeId(99)).is_err());
}

#[test]
fn flatten_collects_leaf_distribution_and_paths() {
    let flat = flatten_standard(&small_experiment(0.25)).unwrap();
    assert_eq!(flat.process.distribution(), &[0.5, 0.5]);
    assert_eq!(flat.paths, vec![vec![0.0, 0.25, 1.0], vec![0.0, -0.25, -1.0]]);
}

#[test]
fn costs_compare_paths() {
    let a = vec![vec![0.0, 0.5, 1.0]];
    let b = vec![vec![0.0, 0.0, -1.0], vec![0.0, 0.0, 1.0]];
    let pc = path_cost(&a, &b);
    assert!((pc[(0, 0)] - 2.5).abs() < 1e-12);
    assert!((pc[(0, 1)] - 0.5).abs() < 1e-12);
    let tc = terminal_cost(&a, &b);
    assert!((tc[(0, 0)] - 2.0).abs() < 1e-12 && tc[(0, 1)].abs() < 1e-12);
    let dc = discrete_cost(2, 3);
    assert_eq!(dc.shape(), (2, 3));
    assert_eq!(dc.sum(), 4.0);
}

#[test]
fn small_experiment_does_not_converge_under_standard_filtration() {
    let limit = possible_limit();
    let limit_std = flatten_standard(&limit).unwrap();
    let f = standard_filtration(&limit);
    let center = f.node(f.root()).children[0];
    let limit_pulled = flatten(&limit, pull_up_children(&f, center).unwrap()).unwrap();
    for n in 0..4 {
        let eps = 0.5f64.powi(n);
        let x = flatten_standard(&small_experiment(eps)).unwrap();
        let cost = path_cost(&x.paths, &limit_std.paths);
        let d_std = adapted_wasserstein(&x.process, &limit_std.process, &cost)
            .unwrap()
            .distance;
        let d_pulled = adapted_wasserstein(&x.process, &limit_pulled.process, &cost)
            .unwrap()
            .distance;
        assert!((d_std - (1.0 + eps)).abs() < 1e-8, "n={n}: {d_std}");
        assert!((d_pulled - eps).abs() < 1e-8, "n={n}: {d_pulled}");
    }
}

#[test]
fn pulled_up_coin_toss_is_farther_than_identical_filtration() {
    let t = coin_toss_tree(2, 0.5);
    let fine = flatten_standard(&t).unwrap();
    let f = standard_filtration(&t);
    let s0 = f.node(f.root()).children[0];
    let pulled = flatten(&t, pull_up_children(&f, s0).unwrap()).unwrap();
    let cost = terminal_cost(&fine.paths, &pulled.paths);
    let same = adapted_wasserstein(&fine.process, &fine.process, &cost).unwrap();
    let other = adapted_wasserstein(&fine.process, &pulled.process, &cost).unwrap();
    assert!(same.distance.abs() < 1e-9);
    assert!(other.distance > same.distance + 1e-6, "{}", other.distance);
}

#[test]
fn depth_five_coin_toss_pairs_solve() {
    let tree = coin_toss_tree(5, 0.5);
    let fine = flatten_standard(&tree).unwrap();
    let f = standard_filtration(&tree);
    let s0 = f.node(f.root()).children[0];
    let pulled = flatten(&tree, pull_up_children(&f, s0).unwrap()).unwrap();
    let cost = terminal_cost(&fine.paths, &pulled.paths);
    let res = adapted_wasserstein(&fine.process, &pulled.process, &cost).unwrap();
    assert_eq!(res.constraints.cols, 1024);
    assert!(res.distance >= -1e-9);
    assert!(res.residual.max_violation < 1e-7);
    for (x, &px) in fine.process.distribution().iter().enumerate() {
        assert!((res.coupling.row(x).sum() - px).abs() < 1e-7);
    }

    // Same-uniform coupling of the coins is bicausal and attains the mean gap
    // 5 · (0.5 - 0.3), which bounds every coupling from below.
    let biased = flatten_standard(&coin_toss_tree(5, 0.3)).unwrap();
    let cost = terminal_cost(&fine.paths, &biased.paths);
    let res = adapted_wasserstein(&fine.process, &biased.process, &cost).unwrap();
    assert!((res.distance - 1.0).abs() < 1e-7, "{}", res.distance);
    for (y, &py) in biased.process.distribution().iter().enumerate() {
        assert!((res.coupling.column(y).sum() - py).abs() < 1e-7);
    }
}

#[test]
fn identical_processes_have_zero_distance_and_diagonal_coupling() {
    for seed in [1u64, 7, 42] {
        let flat = flatten_standard(&random_coin_tree(2, seed)).unwrap();
        let n = flat.process.len();
        let cost = discrete_cost(n, n) * 100.0;
        let res = adapted_wasserstein(&flat.process, &flat.process, &cost).unwrap();
        assert!(res.distance.abs() < 1e-9);
        for i in 0..n {
            assert!((res.coupling[(i, i)] - flat.process.distribution()[i]).abs() < 1e-9);
        }
    }
}

#[test]
fn random_coin_tree_is_reproducible() {
    assert_eq!(random_coin_tree(3, 9), random_coin_tree(3, 9));
    assert_ne!(random_coin_tree(3, 9), random_coin_tree(3, 10));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn marginals_hold_and_swap_is_symmetric(s1 in 0u64..1_000, s2 in 0u64..1_000) {
        let a = flatten_standard(&random_coin_tree(2, s1)).unwrap();
        let b = flatten_standard(&random_coin_tree(2, s2)).unwrap();
        let cost = terminal_cost(&a.paths, &b.paths);
        let ab = adapted_wasserstein(&a.process, &b.process, &cost).unwrap();
        let ba = adapted_wasserstein(&b.process, &a.process, &cost.transpose()).unwrap();
        prop_assert!((ab.distance - ba.distance).abs() < 1e-8);
        for (x, &px) in a.process.distribution().iter().enumerate() {
            prop_assert!((ab.coupling.row(x).sum() - px).abs() < 1e-8);
        }
        for (y, &py) in b.process.distribution().iter().enumerate() {
            prop_assert!((ab.coupling.column(y).sum() - py).abs() < 1e-8);
        }
        prop_assert!(ab.residual.max_violation < 1e-8);
    }
}
