//! Adapted (bicausal) Wasserstein distance between two processes.
//!
//! Pipeline: validate both processes and the cost matrix, build the sparse
//! constraint system once, solve the LP once, and package the coupling with a
//! residual diagnostic. Failures are surfaced as-is; the computation is a pure
//! function of its inputs, so there is nothing to retry.
//!
//! Code cross-refs: `constraints::build_constraints`, `lp::CouplingSolver`,
//! `observe::SolveObserver`.

use std::fmt;

use nalgebra::{DMatrix, DVector};

use crate::cfg::MASS_EPS;
use crate::constraints::{build_constraints, BuildError, ConstraintStats, FormulationCfg, Sense};
use crate::lp::{CouplingSolver, SolveError, SolverCfg};
use crate::observe::{SolveObserver, SolveStats, TracingObserver};
use crate::process::{check_distribution, Process, ProcessError};

/// Which input a validation error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DistanceError {
    Process { side: Side, source: ProcessError },
    CostShape {
        expected: (usize, usize),
        got: (usize, usize),
    },
    /// Cost entries must be finite and non-negative.
    InvalidCost { row: usize, col: usize, value: f64 },
    Build(BuildError),
    Solve(SolveError),
}

impl fmt::Display for DistanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process { side, source } => write!(f, "{side} process: {source}"),
            Self::CostShape { expected, got } => write!(
                f,
                "cost matrix is {}x{}, expected {}x{}",
                got.0, got.1, expected.0, expected.1
            ),
            Self::InvalidCost { row, col, value } => {
                write!(f, "cost[{row}][{col}] = {value} is not a finite non-negative number")
            }
            Self::Build(e) => write!(f, "constraint building failed: {e}"),
            Self::Solve(e) => write!(f, "coupling solve failed: {e}"),
        }
    }
}

impl std::error::Error for DistanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Process { source, .. } => Some(source),
            Self::Build(e) => Some(e),
            Self::Solve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BuildError> for DistanceError {
    fn from(e: BuildError) -> Self {
        Self::Build(e)
    }
}

impl From<SolveError> for DistanceError {
    fn from(e: SolveError) -> Self {
        Self::Solve(e)
    }
}

/// Everything a distance computation is parameterized by.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceCfg {
    pub formulation: FormulationCfg,
    pub solver: SolverCfg,
    /// Tolerance on `|Σ p - 1|` when re-validating the inputs.
    pub eps_mass: f64,
}

impl Default for DistanceCfg {
    fn default() -> Self {
        Self {
            formulation: FormulationCfg::default(),
            solver: SolverCfg::default(),
            eps_mass: MASS_EPS,
        }
    }
}

/// Constraint residual at the returned coupling.
#[derive(Clone, Debug)]
pub struct Residual {
    /// `A x`.
    pub activity: DVector<f64>,
    /// `b - A x`; all rows are tight at optimality, so this is ≈ 0.
    pub slack: DVector<f64>,
    /// Euclidean norm of `slack`.
    pub norm: f64,
    /// Largest violation of a row's relation (0 when feasible).
    pub max_violation: f64,
}

/// Optimal bicausal coupling and its cost.
#[derive(Clone, Debug)]
pub struct CouplingResult {
    /// `n1 × n2`, rows indexed by source outcomes.
    pub coupling: DMatrix<f64>,
    pub distance: f64,
    pub residual: Residual,
    pub constraints: ConstraintStats,
    pub solve: SolveStats,
}

/// Orchestrates validation, constraint building and the LP solve.
pub struct DistanceComputer {
    cfg: DistanceCfg,
    solver: CouplingSolver,
}

impl Default for DistanceComputer {
    fn default() -> Self {
        Self::new(DistanceCfg::default())
    }
}

impl DistanceComputer {
    pub fn new(cfg: DistanceCfg) -> Self {
        Self {
            cfg,
            solver: CouplingSolver::new(cfg.solver),
        }
    }

    /// Use an explicit solver (e.g. an external LP backend).
    pub fn with_solver(cfg: DistanceCfg, solver: CouplingSolver) -> Self {
        Self { cfg, solver }
    }

    #[inline]
    pub fn cfg(&self) -> &DistanceCfg {
        &self.cfg
    }

    /// Compute with `TracingObserver`.
    pub fn compute(
        &self,
        p1: &Process,
        p2: &Process,
        cost: &DMatrix<f64>,
    ) -> Result<CouplingResult, DistanceError> {
        self.compute_observed(p1, p2, cost, &mut TracingObserver)
    }

    /// Compute and report events to `observer`.
    pub fn compute_observed(
        &self,
        p1: &Process,
        p2: &Process,
        cost: &DMatrix<f64>,
        observer: &mut dyn SolveObserver,
    ) -> Result<CouplingResult, DistanceError> {
        let _span = tracing::debug_span!("adapted_distance", n1 = p1.len(), n2 = p2.len()).entered();
        let result = self.run(p1, p2, cost, observer);
        if let Err(e) = &result {
            observer.on_failed(e);
        }
        result
    }

    fn run(
        &self,
        p1: &Process,
        p2: &Process,
        cost: &DMatrix<f64>,
        observer: &mut dyn SolveObserver,
    ) -> Result<CouplingResult, DistanceError> {
        self.validate(p1, Side::Source)?;
        self.validate(p2, Side::Target)?;
        let (n1, n2) = (p1.len(), p2.len());
        let flat_cost = flatten_cost(cost, n1, n2)?;

        let system = build_constraints(p1, p2, self.cfg.formulation)?;
        let constraints = system.stats();
        observer.on_constraints(&constraints);

        let solution = self.solver.solve(&flat_cost, &system)?;

        let slack = DVector::from_iterator(
            system.nrows(),
            system
                .b
                .iter()
                .zip(solution.activity.iter())
                .map(|(b, ax)| b - ax),
        );
        let max_violation = slack
            .iter()
            .zip(&system.senses)
            .map(|(&s, sense)| match sense {
                Sense::Le => (-s).max(0.0),
                Sense::Eq => s.abs(),
            })
            .fold(0.0, f64::max);
        let residual = Residual {
            norm: slack.norm(),
            max_violation,
            slack,
            activity: solution.activity,
        };
        let solve = SolveStats {
            iterations: solution.iterations,
            elapsed: solution.elapsed,
            objective: solution.objective,
            residual_norm: residual.norm,
        };
        observer.on_solved(&solve);

        Ok(CouplingResult {
            coupling: DMatrix::from_row_slice(n1, n2, solution.x.as_slice()),
            distance: solution.objective,
            residual,
            constraints,
            solve,
        })
    }

    fn validate(&self, p: &Process, side: Side) -> Result<(), DistanceError> {
        check_distribution(p.distribution(), self.cfg.eps_mass)
            .and_then(|()| p.filtration().validate(p.len()))
            .map_err(|source| DistanceError::Process { side, source })
    }
}

/// Adapted distance with default settings.
pub fn adapted_wasserstein(
    p1: &Process,
    p2: &Process,
    cost: &DMatrix<f64>,
) -> Result<CouplingResult, DistanceError> {
    DistanceComputer::default().compute(p1, p2, cost)
}

/// Row-major copy of `cost` after shape and sign checks.
fn flatten_cost(cost: &DMatrix<f64>, n1: usize, n2: usize) -> Result<Vec<f64>, DistanceError> {
    if cost.shape() != (n1, n2) {
        return Err(DistanceError::CostShape {
            expected: (n1, n2),
            got: cost.shape(),
        });
    }
    let mut flat = Vec::with_capacity(n1 * n2);
    for row in 0..n1 {
        for col in 0..n2 {
            let value = cost[(row, col)];
            if !value.is_finite() || value < 0.0 {
                return Err(DistanceError::InvalidCost { row, col, value });
            }
            flat.push(value);
        }
    }
    Ok(flat)
}
