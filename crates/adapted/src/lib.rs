//! Adapted (bicausal) Wasserstein distance between finite filtered processes.
//!
//! Layers, leaves first:
//! - `filtration`: arena trees of nested outcome partitions.
//! - `process`: distribution + filtration, validated on construction.
//! - `constraints`: sparse marginal and bicausal refinement rows.
//! - `lp`: linear-program backends behind `CouplingSolver`.
//! - `distance`: orchestration, result packaging, residual diagnostics.
//! - `generate`: experiment trees, standard filtrations, cost matrices.
//!
//! API Policy
//! - This crate is project-internal. There is no stable public API; prefer the
//!   curated re-exports in `api` and `prelude`.

mod cfg;

pub mod api;
pub mod constraints;
pub mod distance;
pub mod filtration;
pub mod generate;
pub mod lp;
pub mod observe;
pub mod process;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use distance::{adapted_wasserstein, CouplingResult, DistanceCfg, DistanceComputer};
pub use filtration::{FiltrationTree, NodeId};
pub use process::Process;

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::constraints::{DepthPolicy, FormulationCfg, MarginalEncoding, MirrorMass};
    pub use crate::distance::{
        adapted_wasserstein, CouplingResult, DistanceCfg, DistanceComputer, DistanceError,
    };
    pub use crate::filtration::{FiltrationTree, NodeId};
    pub use crate::lp::SolverCfg;
    pub use crate::observe::{MetricsObserver, SolveObserver, TracingObserver};
    pub use crate::process::Process;
    pub use nalgebra::DMatrix;
}
