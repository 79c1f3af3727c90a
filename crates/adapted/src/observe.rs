//! Observability hook for distance computations.
//!
//! Each computation reports discrete events (constraint statistics, solve
//! statistics, failure) to a `SolveObserver` handed in by the caller.
//! `TracingObserver` turns them into `tracing` events; `MetricsObserver`
//! keeps them in memory.

use std::time::Duration;

use crate::constraints::ConstraintStats;
use crate::distance::DistanceError;

/// Statistics of a successful LP solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolveStats {
    pub iterations: usize,
    pub elapsed: Duration,
    pub objective: f64,
    pub residual_norm: f64,
}

/// Receives events from `DistanceComputer`; every method defaults to a no-op.
pub trait SolveObserver {
    fn on_constraints(&mut self, _stats: &ConstraintStats) {}
    fn on_solved(&mut self, _stats: &SolveStats) {}
    fn on_failed(&mut self, _err: &DistanceError) {}
}

/// Emits one `tracing` event per hook.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl SolveObserver for TracingObserver {
    fn on_constraints(&mut self, s: &ConstraintStats) {
        tracing::info!(
            rows = s.rows,
            cols = s.cols,
            nnz = s.nnz,
            sparsity = s.sparsity,
            source_refinement = s.source_refinement,
            target_refinement = s.target_refinement,
            "constraint system"
        );
    }

    fn on_solved(&mut self, s: &SolveStats) {
        tracing::info!(
            iterations = s.iterations,
            elapsed_ms = s.elapsed.as_secs_f64() * 1e3,
            objective = s.objective,
            residual_norm = s.residual_norm,
            "coupling solved"
        );
    }

    fn on_failed(&mut self, err: &DistanceError) {
        tracing::warn!(error = %err, "adapted distance failed");
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl SolveObserver for NullObserver {}

/// One recorded observer event.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Constraints(ConstraintStats),
    Solved(SolveStats),
    Failed(String),
}

/// In-memory metrics sink.
#[derive(Clone, Debug, Default)]
pub struct MetricsObserver {
    pub events: Vec<Event>,
}

impl MetricsObserver {
    /// Total solve time over all recorded solves.
    pub fn total_solve_time(&self) -> Duration {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Solved(s) => Some(s.elapsed),
                _ => None,
            })
            .sum()
    }

    pub fn last_constraints(&self) -> Option<&ConstraintStats> {
        self.events.iter().rev().find_map(|e| match e {
            Event::Constraints(s) => Some(s),
            _ => None,
        })
    }
}

impl SolveObserver for MetricsObserver {
    fn on_constraints(&mut self, stats: &ConstraintStats) {
        self.events.push(Event::Constraints(*stats));
    }

    fn on_solved(&mut self, stats: &SolveStats) {
        self.events.push(Event::Solved(*stats));
    }

    fn on_failed(&mut self, err: &DistanceError) {
        self.events.push(Event::Failed(err.to_string()));
    }
}
