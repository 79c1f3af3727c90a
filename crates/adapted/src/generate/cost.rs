//! Cost matrices over outcome pairs.

use nalgebra::DMatrix;

use super::LeafPath;

/// `Σ_k |a_k - b_k|` over the aligned positions of the two value paths
/// (root first). Paths of unequal length are compared on their common prefix.
pub fn path_cost(source: &[LeafPath], target: &[LeafPath]) -> DMatrix<f64> {
    DMatrix::from_fn(source.len(), target.len(), |i, j| {
        source[i]
            .iter()
            .zip(&target[j])
            .map(|(a, b)| (a - b).abs())
            .sum()
    })
}

/// `|a_T - b_T|` on the final values.
pub fn terminal_cost(source: &[LeafPath], target: &[LeafPath]) -> DMatrix<f64> {
    let last = |p: &LeafPath| p.last().copied().unwrap_or(0.0);
    DMatrix::from_fn(source.len(), target.len(), |i, j| {
        (last(&source[i]) - last(&target[j])).abs()
    })
}

/// 0 on the diagonal, 1 elsewhere.
pub fn discrete_cost(n1: usize, n2: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n1, n2, |i, j| if i == j { 0.0 } else { 1.0 })
}
