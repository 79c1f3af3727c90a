//! Two-phase primal simplex on a dense tableau.
//!
//! Standard form
//! - Every `≤` row gets a slack column. Rows with a negative right-hand side
//!   are negated first so the tableau starts with `rhs ≥ 0`.
//! - `=` rows and negated `≤` rows get an artificial column and start with it
//!   basic; phase one minimizes the artificial sum, phase two the real cost.
//! - Artificial columns never re-enter the basis.
//!
//! Pricing is Dantzig (most negative reduced cost). After `DEGENERATE_SWITCH`
//! consecutive steps no longer than `eps_feas`, pricing switches to Bland's
//! rule for the rest of the phase; with the smallest-index ratio tie break
//! this cannot cycle.

use std::time::Instant;

use nalgebra::{DMatrix, DVector};

use crate::cfg::DEGENERATE_SWITCH;
use crate::constraints::{ConstraintSystem, Sense};

use super::types::{LpSolution, SolveError, SolverCfg};

/// Minimize `cost · x` subject to `sys` and `x ≥ 0`.
pub(crate) fn dense_simplex(
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

    let mut tab = Tableau::assemble(sys, cfg.sparse_assembly);
    let mut iterations = 0usize;

    if tab.art_start < tab.width {
        let art_start = tab.art_start;
        tab.price(|j| if j >= art_start { 1.0 } else { 0.0 });
        tab.run(cfg, &mut iterations)?;
        let infeasibility = tab.artificial_sum();
        if infeasibility > cfg.eps_feas {
            tracing::debug!(infeasibility, iterations, "phase one ended with artificials");
            return Err(SolveError::Infeasible { rows, cols });
        }
        tab.drive_out_artificials(cfg.eps_pivot);
    }

    tab.price(|j| if j < cols { cost[j] } else { 0.0 });
    tab.run(cfg, &mut iterations)?;

    let x = tab.primal(cols);
    let objective = cost.iter().zip(x.iter()).map(|(c, v)| c * v).sum();
    let activity = sys.eval(&x);
    Ok(LpSolution {
        x,
        objective,
        activity,
        iterations,
        elapsed: start.elapsed(),
    })
}

struct Tableau {
    /// `m × (width + 1)`; the last column is the right-hand side.
    t: DMatrix<f64>,
    /// Reduced costs of the current phase, one per non-rhs column.
    d: Vec<f64>,
    basis: Vec<usize>,
    /// Columns `art_start..width` are artificial.
    art_start: usize,
    width: usize,
    /// Problem size for error reports.
    rows: usize,
    cols: usize,
}

impl Tableau {
    fn assemble(sys: &ConstraintSystem, sparse: bool) -> Self {
        let (m, n) = (sys.nrows(), sys.ncols());
        let n_le = sys.senses.iter().filter(|&&s| s == Sense::Le).count();
        let needs_art: Vec<bool> = sys
            .senses
            .iter()
            .zip(&sys.b)
            .map(|(&s, &b)| s == Sense::Eq || b < 0.0)
            .collect();
        let n_art = needs_art.iter().filter(|&&a| a).count();
        let art_start = n + n_le;
        let width = art_start + n_art;

        let dense = (!sparse).then(|| sys.a.to_dense());
        let mut t = DMatrix::zeros(m, width + 1);
        let mut basis = vec![0usize; m];
        let mut slack_col = n;
        let mut art_col = art_start;
        for i in 0..m {
            let sign = if sys.b[i] < 0.0 { -1.0 } else { 1.0 };
            match &dense {
                Some(a) => {
                    for j in 0..n {
                        let v = a[(i, j)];
                        if v != 0.0 {
                            t[(i, j)] = sign * v;
                        }
                    }
                }
                None => {
                    let (idx, vals) = sys.a.row(i);
                    for (&j, &v) in idx.iter().zip(vals) {
                        t[(i, j)] = sign * v;
                    }
                }
            }
            if sys.senses[i] == Sense::Le {
                t[(i, slack_col)] = sign;
                basis[i] = slack_col;
                slack_col += 1;
            }
            if needs_art[i] {
                t[(i, art_col)] = 1.0;
                basis[i] = art_col;
                art_col += 1;
            }
            t[(i, width)] = sign * sys.b[i];
        }
        Self {
            t,
            d: vec![0.0; width],
            basis,
            art_start,
            width,
            rows: m,
            cols: n,
        }
    }

    /// Reduced costs `d_j = c_j - Σ_i c_{B(i)} t_ij` for the phase cost `c`.
    fn price(&mut self, c: impl Fn(usize) -> f64) {
        let cb: Vec<f64> = self.basis.iter().map(|&j| c(j)).collect();
        for j in 0..self.width {
            let col = self.t.column(j);
            let dot: f64 = cb.iter().zip(col.iter()).map(|(a, b)| a * b).sum();
            self.d[j] = c(j) - dot;
        }
    }

    fn rhs(&self, i: usize) -> f64 {
        self.t[(i, self.width)]
    }

    fn artificial_sum(&self) -> f64 {
        (0..self.rows)
            .filter(|&i| self.basis[i] >= self.art_start)
            .map(|i| self.rhs(i))
            .sum()
    }

    fn run(&mut self, cfg: &SolverCfg, iterations: &mut usize) -> Result<(), SolveError> {
        let mut stalled = 0usize;
        loop {
            let bland = stalled >= DEGENERATE_SWITCH;
            let Some(enter) = self.entering(cfg.eps_feas, bland) else {
                return Ok(());
            };
            if *iterations >= cfg.max_iterations {
                return Err(SolveError::IterationLimit {
                    iterations: *iterations,
                    rows: self.rows,
                    cols: self.cols,
                });
            }
            let Some((leave, step)) = self.leaving(enter, cfg.eps_pivot) else {
                return Err(SolveError::Unbounded {
                    rows: self.rows,
                    cols: self.cols,
                });
            };
            if step <= cfg.eps_feas {
                stalled += 1;
            } else if !bland {
                stalled = 0;
            }
            self.pivot(leave, enter);
            *iterations += 1;
        }
    }

    fn entering(&self, eps: f64, bland: bool) -> Option<usize> {
        let candidates = (0..self.art_start).filter(|&j| self.d[j] < -eps);
        if bland {
            candidates.min()
        } else {
            candidates.min_by(|&a, &b| self.d[a].total_cmp(&self.d[b]))
        }
    }

    /// Ratio test; ties go to the smallest basic column index.
    fn leaving(&self, enter: usize, eps_pivot: f64) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for i in 0..self.rows {
            let a = self.t[(i, enter)];
            if a <= eps_pivot {
                continue;
            }
            let ratio = self.rhs(i).max(0.0) / a;
            best = match best {
                None => Some((i, ratio)),
                Some((r, best_ratio)) => {
                    let tie = (ratio - best_ratio).abs() <= 1e-12 * (1.0 + best_ratio);
                    if (ratio < best_ratio && !tie) || (tie && self.basis[i] < self.basis[r]) {
                        Some((i, ratio))
                    } else {
                        Some((r, best_ratio))
                    }
                }
            };
        }
        best
    }

    fn pivot(&mut self, r: usize, j: usize) {
        let p = self.t[(r, j)];
        for k in 0..=self.width {
            self.t[(r, k)] /= p;
        }
        let factors: Vec<(usize, f64)> = (0..self.rows)
            .filter(|&i| i != r)
            .map(|i| (i, self.t[(i, j)]))
            .filter(|&(_, f)| f != 0.0)
            .collect();
        for k in 0..=self.width {
            let prk = self.t[(r, k)];
            if prk == 0.0 {
                continue;
            }
            let mut col = self.t.column_mut(k);
            for &(i, f) in &factors {
                col[i] -= f * prk;
            }
        }
        for &(i, _) in &factors {
            self.t[(i, j)] = 0.0;
        }
        self.t[(r, j)] = 1.0;

        let dj = self.d[j];
        if dj != 0.0 {
            for k in 0..self.width {
                self.d[k] -= dj * self.t[(r, k)];
            }
            self.d[j] = 0.0;
        }
        self.basis[r] = j;
    }

    /// Replace basic artificials (at level zero after phase one) by any
    /// structural or slack column with a usable pivot. Rows with none left are
    /// redundant; their artificial stays basic at zero.
    fn drive_out_artificials(&mut self, eps_pivot: f64) {
        for r in 0..self.rows {
            if self.basis[r] < self.art_start {
                continue;
            }
            let best = (0..self.art_start)
                .map(|j| (j, self.t[(r, j)].abs()))
                .filter(|&(_, a)| a > eps_pivot)
                .max_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((j, _)) = best {
                self.pivot(r, j);
            }
        }
    }

    fn primal(&self, n: usize) -> DVector<f64> {
        let mut x = DVector::zeros(n);
        for (i, &j) in self.basis.iter().enumerate() {
            if j < n {
                x[j] = self.rhs(i).max(0.0);
            }
        }
        x
    }
}
