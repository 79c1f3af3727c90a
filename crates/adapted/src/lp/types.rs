//! Solver configuration, solutions and errors.

use std::fmt;
use std::time::Duration;

use nalgebra::DVector;

use crate::cfg::{FEAS_EPS, MAX_ITERATIONS, PIVOT_EPS};

/// LP algorithm selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Algorithm {
    /// Revised simplex on the sparse rows (`minilp`); scales to deep trees.
    #[default]
    SparseSimplex,
    /// Two-phase primal simplex on a dense tableau (Dantzig pricing with a
    /// Bland fallback on degenerate stalls). Small systems only.
    DenseSimplex,
}

/// Solver configuration passed explicitly into `CouplingSolver`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverCfg {
    pub algorithm: Algorithm,
    /// Dense simplex only: scatter CSR rows straight into the tableau instead
    /// of going through a dense copy of the constraint matrix.
    pub sparse_assembly: bool,
    /// Smallest admissible pivot element.
    pub eps_pivot: f64,
    /// Phase-one infeasibility and reduced-cost threshold.
    pub eps_feas: f64,
    /// Dense simplex pivot cap.
    pub max_iterations: usize,
}

impl Default for SolverCfg {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::SparseSimplex,
            sparse_assembly: true,
            eps_pivot: PIVOT_EPS,
            eps_feas: FEAS_EPS,
            max_iterations: MAX_ITERATIONS,
        }
    }
}

/// Optimal point of `min c·x  s.t.  A x (≤|=) b,  x ≥ 0`.
#[derive(Clone, Debug)]
pub struct LpSolution {
    pub x: DVector<f64>,
    pub objective: f64,
    /// Row activity `A x`.
    pub activity: DVector<f64>,
    /// Pivots performed; 0 for backends that do not report them.
    pub iterations: usize,
    pub elapsed: Duration,
}

/// Solver failures; counts describe the attempted problem.
#[derive(Clone, Debug, PartialEq)]
pub enum SolveError {
    Infeasible {
        rows: usize,
        cols: usize,
    },
    Unbounded {
        rows: usize,
        cols: usize,
    },
    IterationLimit {
        iterations: usize,
        rows: usize,
        cols: usize,
    },
    DimensionMismatch {
        expected: usize,
        got: usize,
    },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infeasible { rows, cols } => {
                write!(f, "linear program is infeasible ({rows} rows, {cols} columns)")
            }
            Self::Unbounded { rows, cols } => {
                write!(f, "linear program is unbounded ({rows} rows, {cols} columns)")
            }
            Self::IterationLimit {
                iterations,
                rows,
                cols,
            } => write!(
                f,
                "simplex stopped after {iterations} iterations ({rows} rows, {cols} columns)"
            ),
            Self::DimensionMismatch { expected, got } => {
                write!(f, "cost vector has length {got}, expected {expected}")
            }
        }
    }
}

impl std::error::Error for SolveError {}
