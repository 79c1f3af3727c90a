//! JSON problem files for `cli solve`.
//!
//! ```json
//! {
//!   "source": { "distribution": [0.5, 0.5],
//!               "filtration": { "subset": [0, 1], "children": [ ... ] } },
//!   "target": { ... },
//!   "cost": [[0.0, 1.0], [1.0, 0.0]]
//! }
//! ```

use adapted::api::{CouplingResult, FiltrationTree, NodeId, Process};
use adapted::prelude::DMatrix;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct Problem {
    pub source: ProcessDto,
    pub target: ProcessDto,
    pub cost: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessDto {
    pub distribution: Vec<f64>,
    pub filtration: NodeDto,
}

/// One filtration cell with its refinement. Unlabelled cells get `parent.k`.
#[derive(Debug, Deserialize)]
pub struct NodeDto {
    #[serde(default)]
    pub label: Option<String>,
    pub subset: Vec<usize>,
    #[serde(default)]
    pub children: Vec<NodeDto>,
}

impl NodeDto {
    pub fn to_tree(&self) -> FiltrationTree {
        let mut tree = match &self.label {
            Some(label) => FiltrationTree::with_root_label(label.clone(), self.subset.clone()),
            None => FiltrationTree::new(self.subset.clone()),
        };
        let root = tree.root();
        attach(&mut tree, root, &self.children);
        tree
    }
}

fn attach(tree: &mut FiltrationTree, parent: NodeId, children: &[NodeDto]) {
    for child in children {
        let id = match &child.label {
            Some(label) => tree.add_labeled_child(parent, label.clone(), child.subset.clone()),
            None => tree.add_child(parent, child.subset.clone()),
        };
        attach(tree, id, &child.children);
    }
}

impl ProcessDto {
    pub fn to_process(&self) -> Result<Process> {
        Ok(Process::new(self.distribution.clone(), self.filtration.to_tree())?)
    }
}

impl Problem {
    pub fn load(path: &str) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {path}"))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {path}"))
    }

    pub fn processes(&self) -> Result<(Process, Process)> {
        let p1 = self.source.to_process().context("source process")?;
        let p2 = self.target.to_process().context("target process")?;
        Ok((p1, p2))
    }

    pub fn cost_matrix(&self) -> Result<DMatrix<f64>> {
        let nrows = self.cost.len();
        let ncols = self.cost.first().map_or(0, Vec::len);
        if let Some(i) = self.cost.iter().position(|row| row.len() != ncols) {
            bail!("cost row {i} has {} entries, expected {ncols}", self.cost[i].len());
        }
        Ok(DMatrix::from_fn(nrows, ncols, |i, j| self.cost[i][j]))
    }
}

/// Serializable summary of a `CouplingResult`.
#[derive(Debug, Serialize)]
pub struct SolveReport {
    pub distance: f64,
    pub coupling: Vec<Vec<f64>>,
    pub rows: usize,
    pub cols: usize,
    pub nnz: usize,
    pub sparsity: f64,
    pub iterations: usize,
    pub elapsed_ms: f64,
    pub residual_norm: f64,
    pub max_violation: f64,
}

impl From<&CouplingResult> for SolveReport {
    fn from(r: &CouplingResult) -> Self {
        Self {
            distance: r.distance,
            coupling: r
                .coupling
                .row_iter()
                .map(|row| row.iter().copied().collect())
                .collect(),
            rows: r.constraints.rows,
            cols: r.constraints.cols,
            nnz: r.constraints.nnz,
            sparsity: r.constraints.sparsity,
            iterations: r.solve.iterations,
            elapsed_ms: r.solve.elapsed.as_secs_f64() * 1e3,
            residual_norm: r.residual.norm,
            max_violation: r.residual.max_violation,
        }
    }
}
