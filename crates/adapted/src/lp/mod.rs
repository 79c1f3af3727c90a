//! Linear-program backend for coupling optimization.
//!
//! Purpose
//! - Minimize `cost · x` over a `ConstraintSystem` with implicit `x ≥ 0`.
//! - Keep the backend behind `LpBackend` so `CouplingSolver` can swap
//!   algorithms by configuration (or accept an external backend) without the
//!   orchestration layer noticing.
//!
//! Backends
//! - `SparseSimplex` (default): revised simplex from `minilp` on the CSR rows.
//!   Handles the depth-5 coin-toss systems (~1.4k rows, 1k columns).
//! - `DenseSimplex`: in-crate two-phase tableau simplex; a cross-check for
//!   small systems, `O(m · (n + m))` memory and work per pivot.
//!
//! Code cross-refs: `constraints::ConstraintSystem`, `distance::DistanceComputer`.

mod revised;
mod simplex;
mod types;

pub use types::{Algorithm, LpSolution, SolveError, SolverCfg};

use crate::constraints::ConstraintSystem;

/// Any LP solver for `min c·x  s.t.  A x (≤|=) b,  x ≥ 0`.
pub trait LpBackend {
    fn minimize(&self, cost: &[f64], system: &ConstraintSystem)
        -> Result<LpSolution, SolveError>;
}

/// Revised simplex over the sparse constraint rows.
#[derive(Clone, Copy, Debug, Default)]
pub struct SparseSimplex {
    pub cfg: SolverCfg,
}

impl LpBackend for SparseSimplex {
    fn minimize(
        &self,
        cost: &[f64],
        system: &ConstraintSystem,
    ) -> Result<LpSolution, SolveError> {
        revised::sparse_simplex(cost, system, &self.cfg)
    }
}

/// Built-in dense two-phase simplex.
#[derive(Clone, Copy, Debug, Default)]
pub struct DenseSimplex {
    pub cfg: SolverCfg,
}

impl LpBackend for DenseSimplex {
    fn minimize(
        &self,
        cost: &[f64],
        system: &ConstraintSystem,
    ) -> Result<LpSolution, SolveError> {
        simplex::dense_simplex(cost, system, &self.cfg)
    }
}

/// Solves the coupling LP with the backend selected by `SolverCfg::algorithm`,
/// or with a caller-supplied backend.
pub struct CouplingSolver {
    backend: Box<dyn LpBackend>,
}

impl CouplingSolver {
    pub fn new(cfg: SolverCfg) -> Self {
        let backend: Box<dyn LpBackend> = match cfg.algorithm {
            Algorithm::SparseSimplex => Box::new(SparseSimplex { cfg }),
            Algorithm::DenseSimplex => Box::new(DenseSimplex { cfg }),
        };
        Self { backend }
    }

    pub fn with_backend(backend: Box<dyn LpBackend>) -> Self {
        Self { backend }
    }

    /// Minimize `cost · x`; `cost` is the row-major flattened `n1 × n2` matrix.
    pub fn solve(
        &self,
        cost: &[f64],
        system: &ConstraintSystem,
    ) -> Result<LpSolution, SolveError> {
        self.backend.minimize(cost, system)
    }
}

impl Default for CouplingSolver {
    fn default() -> Self {
        Self::new(SolverCfg::default())
    }
}

#[cfg(test)]
mod tests;
