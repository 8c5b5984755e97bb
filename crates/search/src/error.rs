//! Search and sweep errors.

use contact_lattice::LatticeError;
use thiserror::Error;

/// Errors from invalid search or sweep parameters.
///
/// These are all caller mistakes detected before any trial runs. Faults
/// inside trials are not errors; they are counted as non-survival.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("bracket bounds must be finite, got [{low}, {high}]")]
    NonFiniteBound { low: f64, high: f64 },

    #[error("infection rates are non-negative, got lower bound {0}")]
    NegativeRate(f64),

    #[error("empty bracket: low {low} must be below high {high}")]
    EmptyBracket { low: f64, high: f64 },

    #[error("epsilon must be positive and finite, got {0}")]
    InvalidEpsilon(f64),

    #[error("at least one trial per bisection step is required")]
    ZeroAttempts,

    #[error("survival threshold must be at least 2, got {0}")]
    ThresholdTooSmall(usize),

    #[error("step budget must be positive when set")]
    ZeroStepBudget,

    #[error("dimension range {min}..={max} is empty")]
    EmptyDimensionRange { min: usize, max: usize },

    #[error(transparent)]
    Lattice(#[from] LatticeError),
}
