//! Sparse revised simplex through `minilp`.
//!
//! The CSR rows are handed over as they are; `minilp` keeps the basis as a
//! sparse LU factorization, so a pivot costs roughly the fill of the factors
//! instead of a full `m × (n + m)` tableau sweep.

use std::time::Instant;

use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Variable};
use nalgebra::DVector;

use crate::constraints::{ConstraintSystem, Sense};

use super::types::{LpSolution, SolveError, SolverCfg};

/// Minimize `cost · x` subject to `sys` and `x ≥ 0`.
pub(crate) fn sparse_simplex(
    cost: &[f64],
    sys: &ConstraintSystem,
    cfg: &SolverCfg,
) -> Result<LpSolution, SolveError> {
    let start = Instant::now();
    let (rows, cols) = (sys.nrows(), sys.ncols());
    if cost.len() != cols {
        return Err(SolveError::DimensionMismatch {
            expected: cols,
            got: cost.len(),
        });
    }

    let mut problem = Problem::new(OptimizationDirection::Minimize);
    let vars: Vec<Variable> = cost
        .iter()
        .map(|&c| problem.add_var(c, (0.0, f64::INFINITY)))
        .collect();

    let mut skipped = 0usize;
    for i in 0..rows {
        let (idx, vals) = sys.a.row(i);
        let rhs = sys.b[i];
        if idx.is_empty() {
            // Row cancelled to `0 (≤|=) rhs`.
            let holds = match sys.senses[i] {
                Sense::Le => rhs >= -cfg.eps_feas,
                Sense::Eq => rhs.abs() <= cfg.eps_feas,
            };
            if !holds {
                return Err(SolveError::Infeasible { rows, cols });
            }
            skipped += 1;
            continue;
        }
        let mut expr = LinearExpr::empty();
        for (&j, &v) in idx.iter().zip(vals) {
            expr.add(vars[j], v);
        }
        let op = match sys.senses[i] {
            Sense::Le => ComparisonOp::Le,
            Sense::Eq => ComparisonOp::Eq,
        };
        problem.add_constraint(expr, op, rhs);
    }

    let solution = problem.solve().map_err(|e| match e {
        minilp::Error::Unbounded => SolveError::Unbounded { rows, cols },
        _ => SolveError::Infeasible { rows, cols },
    })?;

    let x = DVector::from_iterator(cols, vars.iter().map(|&v| solution[v].max(0.0)));
    let objective = cost.iter().zip(x.iter()).map(|(c, v)| c * v).sum();
    let activity = sys.eval(&x);
    tracing::debug!(rows, cols, skipped, objective, "sparse simplex solved");
    Ok(LpSolution {
        x,
        objective,
        activity,
        iterations: 0,
        elapsed: start.elapsed(),
    })
}
