//! Curated internal API (UNSTABLE).
//!
//! Important
//! - This is not a public API. It is a convenience surface for the CLI,
//!   benches and experiments. Breaking changes are allowed and expected.

// Data model
pub use crate::filtration::{FiltrationNode, FiltrationTree, NodeId};
pub use crate::process::{Process, ProcessError};
// Constraint generation
pub use crate::constraints::{
    build_constraints, BuildError, ConstraintStats, ConstraintSystem, CsrMatrix, DepthPolicy,
    FormulationCfg, MarginalEncoding, MirrorMass, RowFamily, Sense,
};
// Solving
pub use crate::lp::{
    Algorithm, CouplingSolver, DenseSimplex, LpBackend, LpSolution, SolveError, SolverCfg,
    SparseSimplex,
};
pub use crate::distance::{
    adapted_wasserstein, CouplingResult, DistanceCfg, DistanceComputer, DistanceError, Residual,
    Side,
};
pub use crate::observe::{Event, MetricsObserver, NullObserver, SolveObserver, SolveStats, TracingObserver};
// Experiments
pub use crate::generate::{
    coin_toss_tree, discrete_cost, flatten, flatten_standard, path_cost, possible_limit,
    pull_up_children, random_coin_tree, small_experiment, standard_filtration, terminal_cost,
    ExperimentTree, Flattened, LeafPath, StateId,
};
