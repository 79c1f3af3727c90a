//! Tolerance defaults shared by validation, constraint building and the LP solver.
//!
//! Policy
//! - Defaults are fixed constants so call sites never juggle epsilons. The
//!   configurable objects (`SolverCfg`, `DistanceCfg`) start from these values.

/// Allowed deviation of a distribution's total mass from 1.
pub(crate) const MASS_EPS: f64 = 1e-9;
/// Entries with magnitude below this are treated as structural zeros in CSR assembly.
pub(crate) const DROP_EPS: f64 = 1e-15;
/// Smallest admissible pivot magnitude in the simplex ratio test.
pub(crate) const PIVOT_EPS: f64 = 1e-9;
/// Feasibility threshold for phase one and for reduced-cost optimality checks.
pub(crate) const FEAS_EPS: f64 = 1e-7;
/// Iteration cap for one simplex run (both phases together).
pub(crate) const MAX_ITERATIONS: usize = 50_000;
/// Consecutive degenerate pivots after which pricing switches to Bland's rule.
pub(crate) const DEGENERATE_SWITCH: usize = 64;
