//! Adapted distance between a fair and a biased coin-toss process.
//!
//! Prints the distance per depth, the size of the constraint system and the
//! solve time, once with the standard filtration on both sides and once with
//! the first split of the biased tree pulled up.

use adapted::api::{
    adapted_wasserstein, coin_toss_tree, flatten, flatten_standard, pull_up_children,
    standard_filtration, terminal_cost,
};

fn main() {
    for depth in 1..=3 {
        let fair = flatten_standard(&coin_toss_tree(depth, 0.5)).expect("fair tree");
        let biased_tree = coin_toss_tree(depth, 0.7);
        let biased = flatten_standard(&biased_tree).expect("biased tree");
        let cost = terminal_cost(&fair.paths, &biased.paths);

        let res = adapted_wasserstein(&fair.process, &biased.process, &cost)
            .expect("standard filtrations");
        println!(
            "depth={depth} filtration=standard distance={:.6} rows={} nnz={} solve_ms={:.3}",
            res.distance,
            res.constraints.rows,
            res.constraints.nnz,
            res.solve.elapsed.as_secs_f64() * 1e3
        );

        let f = standard_filtration(&biased_tree);
        let first = f.node(f.root()).children[0];
        if f.node(first).is_leaf() {
            continue;
        }
        let pulled = flatten(&biased_tree, pull_up_children(&f, first).expect("pull up"))
            .expect("pulled tree");
        let res = adapted_wasserstein(&fair.process, &pulled.process, &cost)
            .expect("pulled filtration");
        println!(
            "depth={depth} filtration=pulled distance={:.6} rows={} nnz={}",
            res.distance, res.constraints.rows, res.constraints.nnz
        );
    }
}
