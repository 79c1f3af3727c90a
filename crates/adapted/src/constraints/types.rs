//! Formulation switches and the assembled constraint system.

use std::fmt;

use nalgebra::DVector;

use super::sparse::CsrMatrix;

/// How the two marginal families are encoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarginalEncoding {
    /// `Σ_y π(x,y) ≤ μ(x)` and `-Σ_x π(x,y) ≤ -ν(y)`; refinement rows `≤ 0`.
    /// Total mass 1 on both sides makes every row tight at any feasible point.
    #[default]
    OneSided,
    /// True equalities for marginals and refinement rows.
    Equality,
}

/// Which distribution weighs the rows that refine the target side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MirrorMass {
    /// Target masses, cells oriented as (source, target).
    #[default]
    OwnSide,
    /// Source masses with target cells used as row indices, as in the
    /// reference formulation. Only meaningful for mirrored, equally sized trees.
    Reference,
}

/// Which depths produce refinement rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DepthPolicy {
    /// Walk depths `0..height(source)`; deeper target levels add no rows.
    #[default]
    SourceHeight,
    /// Reject trees of different heights.
    RequireEqual,
}

/// Switches for `build_constraints`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FormulationCfg {
    pub marginals: MarginalEncoding,
    pub mirror_mass: MirrorMass,
    pub depth: DepthPolicy,
}

impl FormulationCfg {
    /// Settings that reproduce the reference formulation row for row.
    pub fn reference() -> Self {
        Self {
            marginals: MarginalEncoding::OneSided,
            mirror_mass: MirrorMass::Reference,
            depth: DepthPolicy::SourceHeight,
        }
    }
}

/// Row relation against the right-hand side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    Le,
    Eq,
}

/// Origin of a constraint row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowFamily {
    SourceMarginal,
    TargetMarginal,
    /// A source cell is split into its children against a fixed target cell.
    SourceRefinement,
    /// A target cell is split into its children against a fixed source cell.
    TargetRefinement,
}

/// Failures while translating two processes into constraints.
#[derive(Clone, Debug, PartialEq)]
pub enum BuildError {
    DepthMismatch {
        source_height: usize,
        target_height: usize,
    },
    /// Reference mass weighting looked up a target index in the source distribution.
    MassIndexOutOfRange { index: usize, len: usize },
    /// Reference mass weighting used a source index as a coupling column past `n2`.
    ColumnIndexOutOfRange { index: usize, ncols: usize },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthMismatch {
                source_height,
                target_height,
            } => write!(
                f,
                "filtration heights differ: source {source_height}, target {target_height}"
            ),
            Self::MassIndexOutOfRange { index, len } => write!(
                f,
                "reference mass weighting indexes outcome {index} of a {len}-outcome process"
            ),
            Self::ColumnIndexOutOfRange { index, ncols } => write!(
                f,
                "reference mass weighting uses source outcome {index} as a coupling column, but the target has {ncols}"
            ),
        }
    }
}

impl std::error::Error for BuildError {}

/// Row counts per family plus sparsity figures.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConstraintStats {
    pub rows: usize,
    pub cols: usize,
    pub nnz: usize,
    pub sparsity: f64,
    pub source_marginal: usize,
    pub target_marginal: usize,
    pub source_refinement: usize,
    pub target_refinement: usize,
}

/// Sparse linear system over the flattened `n1 × n2` coupling (row-major:
/// cell `(x, y)` is variable `x · n2 + y`).
#[derive(Clone, Debug)]
pub struct ConstraintSystem {
    pub n1: usize,
    pub n2: usize,
    pub a: CsrMatrix,
    pub b: Vec<f64>,
    pub senses: Vec<Sense>,
    pub families: Vec<RowFamily>,
}

impl ConstraintSystem {
    #[inline]
    pub fn nrows(&self) -> usize {
        self.b.len()
    }

    /// Number of variables, `n1 · n2`.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.n1 * self.n2
    }

    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> usize {
        x * self.n2 + y
    }

    /// Row activity `A x`.
    pub fn eval(&self, x: &DVector<f64>) -> DVector<f64> {
        self.a.mul_vec(x)
    }

    /// Largest violation of any row at `x` (0 when feasible).
    pub fn max_violation(&self, x: &DVector<f64>) -> f64 {
        let ax = self.eval(x);
        ax.iter()
            .zip(&self.b)
            .zip(&self.senses)
            .map(|((&lhs, &rhs), sense)| match sense {
                Sense::Le => (lhs - rhs).max(0.0),
                Sense::Eq => (lhs - rhs).abs(),
            })
            .fold(0.0, f64::max)
    }

    pub fn stats(&self) -> ConstraintStats {
        let count = |fam: RowFamily| self.families.iter().filter(|&&f| f == fam).count();
        ConstraintStats {
            rows: self.nrows(),
            cols: self.ncols(),
            nnz: self.a.nnz(),
            sparsity: self.a.density(),
            source_marginal: count(RowFamily::SourceMarginal),
            target_marginal: count(RowFamily::TargetMarginal),
            source_refinement: count(RowFamily::SourceRefinement),
            target_refinement: count(RowFamily::TargetRefinement),
        }
    }
}
