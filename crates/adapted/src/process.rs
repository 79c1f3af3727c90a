//! Finite processes: a distribution over outcomes plus its filtration.
//!
//! A `Process` is validated on construction and read-only afterwards, so the
//! constraint builder can index `distribution` by any subset of the filtration
//! without re-checking bounds.

use std::fmt;

use crate::cfg::MASS_EPS;
use crate::filtration::FiltrationTree;

/// Validation failures for distributions and filtrations.
#[derive(Clone, Debug, PartialEq)]
pub enum ProcessError {
    InvalidDistribution { reason: String },
    InvalidFiltration { reason: String },
}

impl ProcessError {
    pub(crate) fn distribution(reason: impl Into<String>) -> Self {
        Self::InvalidDistribution {
            reason: reason.into(),
        }
    }

    pub(crate) fn filtration(reason: impl Into<String>) -> Self {
        Self::InvalidFiltration {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDistribution { reason } => write!(f, "invalid distribution: {reason}"),
            Self::InvalidFiltration { reason } => write!(f, "invalid filtration: {reason}"),
        }
    }
}

impl std::error::Error for ProcessError {}

/// Probability-weighted outcome space with a nested information structure.
#[derive(Clone, Debug, PartialEq)]
pub struct Process {
    distribution: Vec<f64>,
    filtration: FiltrationTree,
}

impl Process {
    /// Validate with the default mass tolerance.
    pub fn new(distribution: Vec<f64>, filtration: FiltrationTree) -> Result<Self, ProcessError> {
        Self::with_tolerance(distribution, filtration, MASS_EPS)
    }

    /// Validate that `distribution` is a probability vector (within `eps_mass`)
    /// and that `filtration` partitions its index set.
    pub fn with_tolerance(
        distribution: Vec<f64>,
        filtration: FiltrationTree,
        eps_mass: f64,
    ) -> Result<Self, ProcessError> {
        check_distribution(&distribution, eps_mass)?;
        filtration.validate(distribution.len())?;
        Ok(Self {
            distribution,
            filtration,
        })
    }

    /// Uniform distribution over `n` outcomes with the trivial one-level filtration.
    pub fn uniform_trivial(n: usize) -> Result<Self, ProcessError> {
        let p = 1.0 / n as f64;
        Self::new(vec![p; n], FiltrationTree::trivial(n))
    }

    #[inline]
    pub fn distribution(&self) -> &[f64] {
        &self.distribution
    }

    #[inline]
    pub fn filtration(&self) -> &FiltrationTree {
        &self.filtration
    }

    /// Number of outcomes.
    #[inline]
    pub fn len(&self) -> usize {
        self.distribution.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distribution.is_empty()
    }

    /// Total probability of the outcomes in `subset`.
    #[inline]
    pub fn mass(&self, subset: &[usize]) -> f64 {
        subset.iter().map(|&i| self.distribution[i]).sum()
    }
}

pub(crate) fn check_distribution(distribution: &[f64], eps_mass: f64) -> Result<(), ProcessError> {
    if distribution.is_empty() {
        return Err(ProcessError::distribution("no outcomes"));
    }
    if let Some((i, p)) = distribution
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || **p < 0.0)
    {
        return Err(ProcessError::distribution(format!(
            "entry {i} is {p}; probabilities must be finite and non-negative"
        )));
    }
    let total: f64 = distribution.iter().sum();
    if (total - 1.0).abs() > eps_mass {
        return Err(ProcessError::distribution(format!(
            "total mass is {total}, expected 1 (tolerance {eps_mass:e})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_uniform_trivial() {
        let p = Process::uniform_trivial(4).unwrap();
        assert_eq!(p.len(), 4);
        assert!((p.mass(&[0, 1, 2, 3]) - 1.0).abs() < 1e-12);
        assert!((p.mass(&[1, 3]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_mass_not_one() {
        let err = Process::new(vec![0.5, 0.4], FiltrationTree::trivial(2)).unwrap_err();
        assert!(matches!(err, ProcessError::InvalidDistribution { .. }));
    }

    #[test]
    fn rejects_negative_and_nan_entries() {
        let err = Process::new(vec![1.5, -0.5], FiltrationTree::trivial(2)).unwrap_err();
        assert!(matches!(err, ProcessError::InvalidDistribution { .. }));
        let err = Process::new(vec![f64::NAN, 1.0], FiltrationTree::trivial(2)).unwrap_err();
        assert!(matches!(err, ProcessError::InvalidDistribution { .. }));
    }

    #[test]
    fn rejects_filtration_of_wrong_size() {
        let err = Process::new(vec![0.5, 0.5], FiltrationTree::trivial(3)).unwrap_err();
        assert!(matches!(err, ProcessError::InvalidFiltration { .. }));
    }

    #[test]
    fn tolerance_is_configurable() {
        let d = vec![0.5, 0.5 + 1e-6];
        assert!(Process::new(d.clone(), FiltrationTree::trivial(2)).is_err());
        assert!(Process::with_tolerance(d, FiltrationTree::trivial(2), 1e-5).is_ok());
    }
}
