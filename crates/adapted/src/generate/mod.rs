//! Experiment processes, standard filtrations and cost matrices.
//!
//! Purpose
//! - Produce the inputs the distance computation consumes: a probability tree
//!   of states, its standard filtration (every node reveals the leaves below
//!   it), the flattened `Process`, and a cost matrix over outcome pairs.
//! - Provide the pull-up transformation that makes a filtration reveal one
//!   node's split a step earlier.
//!
//! Model
//! - `coin_toss_tree(depth, p)`: child 0 keeps the value with probability
//!   `1-p`, child 1 adds one with probability `p`.
//! - `small_experiment(d)` / `possible_limit()`: the two-step pair whose
//!   distance shrinks as `d → 0` under the standard filtration but not when
//!   the limit's filtration is pulled up.
//! - Randomized trees draw per-node biases from a seeded `StdRng`.
//!
//! Code cross-refs: `filtration::FiltrationTree`, `process::Process`.

mod cost;
mod tree;

pub use cost::{discrete_cost, path_cost, terminal_cost};
pub use tree::{ExperimentTree, StateId, StateNode};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::filtration::{FiltrationTree, NodeId};
use crate::process::{Process, ProcessError};

/// Values `s` along the root → leaf path of one outcome.
pub type LeafPath = Vec<f64>;

/// A flattened experiment: the process and, per outcome, its value path.
#[derive(Clone, Debug)]
pub struct Flattened {
    pub process: Process,
    pub paths: Vec<LeafPath>,
}

/// Binary coin-toss tree of the given depth with success probability `p`.
pub fn coin_toss_tree(depth: usize, p: f64) -> ExperimentTree {
    let mut tree = ExperimentTree::new("s", 0.0);
    let mut generation = vec![tree.root()];
    for _ in 0..depth {
        let mut next = Vec::with_capacity(generation.len() * 2);
        for id in generation {
            let (label, pn, sn) = {
                let n = tree.node(id);
                (n.label.clone(), n.p, n.s)
            };
            next.push(tree.add_child(id, format!("{label}0"), (1.0 - p) * pn, sn));
            next.push(tree.add_child(id, format!("{label}1"), p * pn, sn + 1.0));
        }
        generation = next;
    }
    tree
}

/// Coin-toss tree where every inner node draws its own bias from `[0.1, 0.9]`.
pub fn random_coin_tree(depth: usize, seed: u64) -> ExperimentTree {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tree = ExperimentTree::new("s", 0.0);
    let mut generation = vec![tree.root()];
    for _ in 0..depth {
        let mut next = Vec::with_capacity(generation.len() * 2);
        for id in generation {
            let bias: f64 = rng.gen_range(0.1..0.9);
            let (label, pn, sn) = {
                let n = tree.node(id);
                (n.label.clone(), n.p, n.s)
            };
            next.push(tree.add_child(id, format!("{label}0"), (1.0 - bias) * pn, sn));
            next.push(tree.add_child(id, format!("{label}1"), bias * pn, sn + 1.0));
        }
        generation = next;
    }
    tree
}

/// Two branches split at time 1 by `±d`, ending at `±1`.
pub fn small_experiment(d: f64) -> ExperimentTree {
    let mut tree = ExperimentTree::new("s", 0.0);
    let root = tree.root();
    let up = tree.add_child(root, "up", 0.5, d);
    let down = tree.add_child(root, "down", 0.5, -d);
    tree.add_child(up, "up2", 0.5, 1.0);
    tree.add_child(down, "down2", 0.5, -1.0);
    tree
}

/// Nothing happens at time 1; the `±1` split happens at time 2.
pub fn possible_limit() -> ExperimentTree {
    let mut tree = ExperimentTree::new("s", 0.0);
    let center = tree.add_child(tree.root(), "center", 1.0, 0.0);
    tree.add_child(center, "up", 0.5, 1.0);
    tree.add_child(center, "down", 0.5, -1.0);
    tree
}

/// Filtration with the experiment's shape: each node's cell is the set of
/// outcome indices (leaf positions) below it.
pub fn standard_filtration(experiment: &ExperimentTree) -> FiltrationTree {
    let leaves = experiment.leaves();
    let mut leaf_index = vec![None; experiment.len()];
    for (i, leaf) in leaves.iter().enumerate() {
        leaf_index[leaf.0] = Some(i);
    }
    let below = |id: StateId| -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(c) = stack.pop() {
            let node = experiment.node(c);
            if let Some(i) = leaf_index[c.0] {
                out.push(i);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    };

    let root = experiment.root();
    let mut filtration =
        FiltrationTree::with_root_label(experiment.node(root).label.clone(), below(root));
    let mut stack = vec![(root, filtration.root())];
    while let Some((sid, fid)) = stack.pop() {
        for &child in &experiment.node(sid).children {
            let id = filtration.add_labeled_child(
                fid,
                experiment.node(child).label.clone(),
                below(child),
            );
            stack.push((child, id));
        }
    }
    filtration
}

/// Detach `node` and hang each of its children `c` below a fresh cell under
/// `node`'s parent; the fresh cell carries `c`'s subset. The split that `node`
/// revealed at depth `d + 1` is then already known at depth `d`.
///
/// Returns a rebuilt tree; node ids of the input are not valid for it.
pub fn pull_up_children(
    filtration: &FiltrationTree,
    node: NodeId,
) -> Result<FiltrationTree, ProcessError> {
    if node.0 >= filtration.len() {
        return Err(ProcessError::filtration(format!(
            "node {} is not in a filtration of {} cells",
            node.0,
            filtration.len()
        )));
    }
    let Some(parent) = filtration.node(node).parent else {
        return Err(ProcessError::filtration("cannot pull up the children of the root"));
    };
    let root = filtration.node(filtration.root());
    let mut out = FiltrationTree::with_root_label(root.label.clone(), root.subset.clone());
    let mut stack = vec![(filtration.root(), out.root())];
    while let Some((src, dst)) = stack.pop() {
        let mut pending = Vec::new();
        for &child in &filtration.node(src).children {
            if child == node {
                continue;
            }
            let c = filtration.node(child);
            let id = out.add_labeled_child(dst, c.label.clone(), c.subset.clone());
            pending.push((child, id));
        }
        if src == parent {
            let pulled = filtration.node(node);
            for &grandchild in &pulled.children {
                let g = filtration.node(grandchild);
                let cell = out.add_labeled_child(
                    dst,
                    format!("{}#{}", pulled.label, g.label),
                    g.subset.clone(),
                );
                let id = out.add_labeled_child(cell, g.label.clone(), g.subset.clone());
                pending.push((grandchild, id));
            }
        }
        stack.extend(pending.into_iter().rev());
    }
    Ok(out)
}

/// Turn an experiment and a filtration over its leaves into a `Process`.
pub fn flatten(
    experiment: &ExperimentTree,
    filtration: FiltrationTree,
) -> Result<Flattened, ProcessError> {
    let leaves = experiment.leaves();
    let distribution = leaves.iter().map(|&id| experiment.node(id).p).collect();
    let paths = leaves.iter().map(|&id| experiment.path(id)).collect();
    Ok(Flattened {
        process: Process::new(distribution, filtration)?,
        paths,
    })
}

/// `flatten(experiment, standard_filtration(experiment))`.
pub fn flatten_standard(experiment: &ExperimentTree) -> Result<Flattened, ProcessError> {
    flatten(experiment, standard_filtration(experiment))
}

#[cfg(test)]
mod tests;
