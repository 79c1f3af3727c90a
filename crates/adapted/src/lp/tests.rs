use super::*;
use crate::constraints::{ConstraintSystem, CsrBuilder, RowFamily, Sense};

type Row<'a> = (&'a [(usize, f64)], f64, Sense);

/// One-row "coupling" (`n1 = 1`) so any variable count fits.
fn system(nvars: usize, rows: &[Row<'_>]) -> ConstraintSystem {
    let mut a = CsrBuilder::new(nvars);
    let mut b = Vec::new();
    let mut senses = Vec::new();
    for &(entries, rhs, sense) in rows {
        for &(j, v) in entries {
            a.add(j, v);
        }
        a.finish_row();
        b.push(rhs);
        senses.push(sense);
    }
    ConstraintSystem {
        n1: 1,
        n2: nvars,
        a: a.build(),
        families: vec![RowFamily::SourceMarginal; b.len()],
        b,
        senses,
    }
}

fn both_backends() -> [(Algorithm, CouplingSolver); 2] {
    [Algorithm::SparseSimplex, Algorithm::DenseSimplex].map(|algorithm| {
        (
            algorithm,
            CouplingSolver::new(SolverCfg {
                algorithm,
                ..SolverCfg::default()
            }),
        )
    })
}

fn dense() -> SolverCfg {
    SolverCfg {
        algorithm: Algorithm::DenseSimplex,
        ..SolverCfg::default()
    }
}

#[test]
fn covering_inequality_hits_cheapest_variable() {
    // min x0 + 2 x1  s.t.  x0 + x1 >= 1, x0 <= 3
    let sys = system(
        2,
        &[
            (&[(0, -1.0), (1, -1.0)], -1.0, Sense::Le),
            (&[(0, 1.0)], 3.0, Sense::Le),
        ],
    );
    for (algorithm, solver) in both_backends() {
        let sol = solver.solve(&[1.0, 2.0], &sys).unwrap();
        assert!((sol.objective - 1.0).abs() < 1e-9, "{algorithm:?}");
        assert!((sol.x[0] - 1.0).abs() < 1e-9 && sol.x[1].abs() < 1e-9);
        assert!((sol.activity[0] + 1.0).abs() < 1e-9);
        assert!((sol.activity[1] - 1.0).abs() < 1e-9);
    }
}

#[test]
fn equality_rows_and_redundant_copies() {
    // min 3 x0 + x1  s.t.  x0 + x1 = 1 (twice), x0 - x1 <= 0
    let row: &[(usize, f64)] = &[(0, 1.0), (1, 1.0)];
    let sys = system(
        2,
        &[
            (row, 1.0, Sense::Eq),
            (row, 1.0, Sense::Eq),
            (&[(0, 1.0), (1, -1.0)], 0.0, Sense::Le),
        ],
    );
    for (algorithm, solver) in both_backends() {
        let sol = solver.solve(&[3.0, 1.0], &sys).unwrap();
        assert!((sol.objective - 1.0).abs() < 1e-9, "{algorithm:?}");
        assert!((sol.x[1] - 1.0).abs() < 1e-9);
    }
}

#[test]
fn reports_infeasible_with_problem_size() {
    let sys = system(
        2,
        &[
            (&[(0, 1.0), (1, 1.0)], 1.0, Sense::Le),
            (&[(0, -1.0), (1, -1.0)], -2.0, Sense::Le),
        ],
    );
    for (_, solver) in both_backends() {
        let err = solver.solve(&[1.0, 1.0], &sys).unwrap_err();
        assert_eq!(err, SolveError::Infeasible { rows: 2, cols: 2 });
    }
}

#[test]
fn reports_unbounded_for_negative_cost_ray() {
    let sys = system(1, &[(&[(0, -1.0)], -1.0, Sense::Le)]);
    for (_, solver) in both_backends() {
        let err = solver.solve(&[-1.0], &sys).unwrap_err();
        assert_eq!(err, SolveError::Unbounded { rows: 1, cols: 1 });
    }
}

#[test]
fn rejects_cost_of_wrong_length() {
    let sys = system(2, &[(&[(0, 1.0)], 1.0, Sense::Le)]);
    for (_, solver) in both_backends() {
        let err = solver.solve(&[1.0], &sys).unwrap_err();
        assert_eq!(err, SolveError::DimensionMismatch { expected: 2, got: 1 });
    }
}

#[test]
fn iteration_cap_is_honoured() {
    let sys = system(2, &[(&[(0, -1.0), (1, -1.0)], -1.0, Sense::Le)]);
    let cfg = SolverCfg {
        max_iterations: 0,
        ..dense()
    };
    let err = CouplingSolver::new(cfg).solve(&[1.0, 1.0], &sys).unwrap_err();
    assert!(matches!(err, SolveError::IterationLimit { iterations: 0, .. }));
}

#[test]
fn assemblies_and_backends_agree() {
    let sys = system(
        3,
        &[
            (&[(0, 1.0), (1, 1.0), (2, 1.0)], 1.0, Sense::Eq),
            (&[(0, -1.0), (2, 1.0)], 0.0, Sense::Le),
            (&[(1, 1.0)], 0.4, Sense::Le),
        ],
    );
    let cost = [2.0, 1.0, 3.0];
    let scattered = CouplingSolver::new(dense()).solve(&cost, &sys).unwrap();
    let copied = CouplingSolver::new(SolverCfg {
        sparse_assembly: false,
        ..dense()
    })
    .solve(&cost, &sys)
    .unwrap();
    let revised = CouplingSolver::default().solve(&cost, &sys).unwrap();
    // x1 = 0.4, remaining 0.6 on x0 (x2 <= x0 but costs more).
    assert!((scattered.objective - 1.6).abs() < 1e-9);
    assert!((scattered.objective - copied.objective).abs() < 1e-12);
    assert!((scattered.objective - revised.objective).abs() < 1e-9);
}

struct FixedPoint;

impl LpBackend for FixedPoint {
    fn minimize(
        &self,
        cost: &[f64],
        system: &ConstraintSystem,
    ) -> Result<LpSolution, SolveError> {
        let x = nalgebra::DVector::from_element(cost.len(), 0.0);
        Ok(LpSolution {
            activity: system.eval(&x),
            x,
            objective: 0.0,
            iterations: 0,
            elapsed: std::time::Duration::ZERO,
        })
    }
}

#[test]
fn custom_backend_is_used() {
    let sys = system(1, &[(&[(0, 1.0)], 1.0, Sense::Le)]);
    let solver = CouplingSolver::with_backend(Box::new(FixedPoint));
    let sol = solver.solve(&[5.0], &sys).unwrap();
    assert_eq!(sol.objective, 0.0);
    assert_eq!(sol.iterations, 0);
}

#[test]
fn empty_rows_are_checked_not_passed_on() {
    // Row 0 cancelled to `0 <= 0`; row 1 to the impossible `0 <= -1`.
    let ok = system(
        2,
        &[
            (&[], 0.0, Sense::Le),
            (&[(0, -1.0), (1, -1.0)], -1.0, Sense::Le),
        ],
    );
    let sol = CouplingSolver::default().solve(&[1.0, 1.0], &ok).unwrap();
    assert!((sol.objective - 1.0).abs() < 1e-9);
    let bad = system(2, &[(&[], -1.0, Sense::Le)]);
    let err = CouplingSolver::default().solve(&[1.0, 1.0], &bad).unwrap_err();
    assert_eq!(err, SolveError::Infeasible { rows: 1, cols: 2 });
}
