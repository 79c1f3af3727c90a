//! Constraint generation for bicausal couplings.
//!
//! Purpose
//! - Walk two filtrations depth by depth and translate every parent/child
//!   relation into a linear row over the `n1 × n2` coupling.
//! - Emit the rows in CSR form; dense assembly grows as
//!   `rows · n1 · n2` and is prohibitive beyond small depths.
//!
//! Formulation switches (`FormulationCfg`)
//! - `MarginalEncoding::OneSided` keeps the reference encoding (`≤` rows whose
//!   aggregate forces equality); `Equality` writes true equalities.
//! - `MirrorMass::OwnSide` weighs target-side refinements by the target
//!   distribution; `Reference` reproduces the reference weighting.
//! - `DepthPolicy` decides what happens when the trees differ in height.
//!
//! Code cross-refs: `filtration::FiltrationTree::nodes_at_depth`, `lp::solve`.

mod build;
pub mod sparse;
mod types;

pub use build::build_constraints;
pub use sparse::{CsrBuilder, CsrMatrix};
pub use types::{
    BuildError, ConstraintStats, ConstraintSystem, DepthPolicy, FormulationCfg, MarginalEncoding,
    MirrorMass, RowFamily, Sense,
};
