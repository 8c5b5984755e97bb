//! Rate brackets for the bisection.

use crate::SearchError;
use contact_lattice::Dimension;
use serde::Serialize;

/// An interval `[low, high]` of infection rates believed to contain the
/// critical rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bracket {
    pub low: f64,
    pub high: f64,
}

impl Bracket {
    /// Validate and build a bracket: finite, `0 ≤ low < high`.
    pub fn new(low: f64, high: f64) -> Result<Self, SearchError> {
        if !low.is_finite() || !high.is_finite() {
            return Err(SearchError::NonFiniteBound { low, high });
        }
        if low < 0.0 {
            return Err(SearchError::NegativeRate(low));
        }
        if low >= high {
            return Err(SearchError::EmptyBracket { low, high });
        }
        Ok(Self { low, high })
    }

    /// Starting bracket `[1/(2d−1), 2/d]` for dimension `d`.
    ///
    /// The lower end is the branching-process bound `1/(2d−1)`. The upper
    /// end is the classical `λ_c(d) ≤ 2/d`.
    pub fn initial(dimension: Dimension) -> Self {
        let d = dimension.get() as f64;
        Self {
            low: 1.0 / (2.0 * d - 1.0),
            high: 2.0 / d,
        }
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    /// Whether `rate` lies in the half-open interval `(low, high]`.
    pub fn contains(&self, rate: f64) -> bool {
        self.low < rate && rate <= self.high
    }

    /// Number of halvings until the width is at most `epsilon`, i.e.
    /// `⌈log₂(width / epsilon)⌉`, or 0 when already narrow enough.
    pub fn iterations_to(&self, epsilon: f64) -> u32 {
        let mut width = self.width();
        let mut iterations = 0;
        while width > epsilon {
            width /= 2.0;
            iterations += 1;
        }
        iterations
    }
}
