//! Marginal and bicausal refinement rows for a pair of processes.

use crate::filtration::FiltrationNode;
use crate::process::Process;

use super::sparse::CsrBuilder;
use super::types::{
    BuildError, ConstraintSystem, DepthPolicy, FormulationCfg, MarginalEncoding, MirrorMass,
    RowFamily, Sense,
};

/// Build the constraint system whose non-negative solutions are exactly the
/// bicausal couplings of `p1` (rows) and `p2` (columns).
///
/// Row order: `n1` source marginals, `n2` target marginals, then for every
/// depth `t` and every pair of cells `(u, v)` at depth `t` (both in pre-order)
/// one row per child of `u` followed by one row per child of `v`.
///
/// A refinement row for child cell `A` of `C`, against the opposite cell `B`,
/// reads `P(C) · π(A × B) - P(A) · π(C × B) ≤ 0` (or `= 0`). Summed over the
/// children of `C` the left side vanishes, so the `≤` family is tight.
pub fn build_constraints(
    p1: &Process,
    p2: &Process,
    cfg: FormulationCfg,
) -> Result<ConstraintSystem, BuildError> {
    let (f1, f2) = (p1.filtration(), p2.filtration());
    let depth_limit = match cfg.depth {
        DepthPolicy::SourceHeight => f1.height(),
        DepthPolicy::RequireEqual => {
            let (h1, h2) = (f1.height(), f2.height());
            if h1 != h2 {
                return Err(BuildError::DepthMismatch {
                    source_height: h1,
                    target_height: h2,
                });
            }
            h1
        }
    };

    let mut rows = RowSink::new(p1.len(), p2.len(), cfg.marginals);
    rows.marginals(p1.distribution(), p2.distribution());

    for t in 0..depth_limit {
        let cells_x = f1.nodes_at_depth(t);
        let cells_y = f2.nodes_at_depth(t);
        for &u in &cells_x {
            let node1 = f1.node(u);
            for &v in &cells_y {
                let node2 = f2.node(v);
                for &child in &node1.children {
                    rows.source_refinement(p1, f1.node(child), node1, node2);
                }
                for &child in &node2.children {
                    match cfg.mirror_mass {
                        MirrorMass::OwnSide => {
                            rows.target_refinement(p2, f2.node(child), node2, node1)
                        }
                        MirrorMass::Reference => {
                            rows.reference_mirror(p1, f2.node(child), node2, node1)?
                        }
                    }
                }
            }
        }
    }

    let system = rows.finish();
    tracing::debug!(
        rows = system.nrows(),
        cols = system.ncols(),
        nnz = system.a.nnz(),
        depth_limit,
        "constraints built"
    );
    Ok(system)
}

/// Accumulates rows, right-hand sides, senses and families in lock-step.
struct RowSink {
    n1: usize,
    n2: usize,
    encoding: MarginalEncoding,
    a: CsrBuilder,
    b: Vec<f64>,
    senses: Vec<Sense>,
    families: Vec<RowFamily>,
}

impl RowSink {
    fn new(n1: usize, n2: usize, encoding: MarginalEncoding) -> Self {
        Self {
            n1,
            n2,
            encoding,
            a: CsrBuilder::new(n1 * n2),
            b: Vec::new(),
            senses: Vec::new(),
            families: Vec::new(),
        }
    }

    fn push(&mut self, rhs: f64, sense: Sense, family: RowFamily) {
        self.a.finish_row();
        self.b.push(rhs);
        self.senses.push(sense);
        self.families.push(family);
    }

    fn refinement_sense(&self) -> Sense {
        match self.encoding {
            MarginalEncoding::OneSided => Sense::Le,
            MarginalEncoding::Equality => Sense::Eq,
        }
    }

    fn marginals(&mut self, mu: &[f64], nu: &[f64]) {
        let (n1, n2) = (self.n1, self.n2);
        for (x, &px) in mu.iter().enumerate() {
            for y in 0..n2 {
                self.a.add(x * n2 + y, 1.0);
            }
            let sense = match self.encoding {
                MarginalEncoding::OneSided => Sense::Le,
                MarginalEncoding::Equality => Sense::Eq,
            };
            self.push(px, sense, RowFamily::SourceMarginal);
        }
        for (y, &py) in nu.iter().enumerate() {
            match self.encoding {
                MarginalEncoding::OneSided => {
                    for x in 0..n1 {
                        self.a.add(x * n2 + y, -1.0);
                    }
                    self.push(-py, Sense::Le, RowFamily::TargetMarginal);
                }
                MarginalEncoding::Equality => {
                    for x in 0..n1 {
                        self.a.add(x * n2 + y, 1.0);
                    }
                    self.push(py, Sense::Eq, RowFamily::TargetMarginal);
                }
            }
        }
    }

    /// Source cell `parent` split into `child`, against target cell `other`.
    fn source_refinement(
        &mut self,
        p1: &Process,
        child: &FiltrationNode,
        parent: &FiltrationNode,
        other: &FiltrationNode,
    ) {
        let p_a = p1.mass(&child.subset);
        let p_c = p1.mass(&parent.subset);
        let n2 = self.n2;
        for &a in &child.subset {
            for &b in &other.subset {
                self.a.add(a * n2 + b, p_c);
            }
        }
        for &c in &parent.subset {
            for &b in &other.subset {
                self.a.add(c * n2 + b, -p_a);
            }
        }
        let sense = self.refinement_sense();
        self.push(0.0, sense, RowFamily::SourceRefinement);
    }

    /// Target cell `parent` split into `child`, against source cell `other`.
    fn target_refinement(
        &mut self,
        p2: &Process,
        child: &FiltrationNode,
        parent: &FiltrationNode,
        other: &FiltrationNode,
    ) {
        let p_a = p2.mass(&child.subset);
        let p_c = p2.mass(&parent.subset);
        let n2 = self.n2;
        for &b in &other.subset {
            for &a in &child.subset {
                self.a.add(b * n2 + a, p_c);
            }
            for &c in &parent.subset {
                self.a.add(b * n2 + c, -p_a);
            }
        }
        let sense = self.refinement_sense();
        self.push(0.0, sense, RowFamily::TargetRefinement);
    }

    /// Reference weighting of the target-side rows: masses come from the
    /// source distribution and the target cells index matrix rows.
    fn reference_mirror(
        &mut self,
        p1: &Process,
        child: &FiltrationNode,
        parent: &FiltrationNode,
        other: &FiltrationNode,
    ) -> Result<(), BuildError> {
        let (n1, n2) = (self.n1, self.n2);
        let row_check = |i: usize| {
            if i < n1 {
                Ok(())
            } else {
                Err(BuildError::MassIndexOutOfRange { index: i, len: n1 })
            }
        };
        let col_check = |j: usize| {
            if j < n2 {
                Ok(())
            } else {
                Err(BuildError::ColumnIndexOutOfRange { index: j, ncols: n2 })
            }
        };
        for &i in &parent.subset {
            row_check(i)?;
        }
        for &j in &other.subset {
            col_check(j)?;
        }
        let p_a = p1.mass(&child.subset);
        let p_c = p1.mass(&parent.subset);
        for &a in &child.subset {
            for &b in &other.subset {
                self.a.add(a * n2 + b, p_c);
            }
        }
        for &c in &parent.subset {
            for &b in &other.subset {
                self.a.add(c * n2 + b, -p_a);
            }
        }
        let sense = self.refinement_sense();
        self.push(0.0, sense, RowFamily::TargetRefinement);
        Ok(())
    }

    fn finish(self) -> ConstraintSystem {
        debug_assert_eq!(self.a.rows(), self.b.len(), "row and rhs counts diverged");
        ConstraintSystem {
            n1: self.n1,
            n2: self.n2,
            a: self.a.build(),
            b: self.b,
            senses: self.senses,
            families: self.families,
        }
    }
}
