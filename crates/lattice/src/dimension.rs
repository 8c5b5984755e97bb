//! Lattice dimension and unit steps.

use std::fmt;
use thiserror::Error;

/// Errors from lattice construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LatticeError {
    /// ℤ⁰ has no neighbors and no contact process.
    #[error("lattice dimension must be at least 1")]
    ZeroDimension,

    /// Dimension too large for the per-site neighbor counters.
    #[error("lattice dimension {requested} exceeds the supported maximum of {max}")]
    TooLarge {
        /// Requested dimension.
        requested: usize,
        /// Largest supported dimension.
        max: usize,
    },
}

/// Dimension `d` of the lattice ℤᵈ.
///
/// Fixed for the lifetime of a [`LatticeGraph`](crate::LatticeGraph). Every
/// coordinate stored in a graph must have exactly `d` components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dimension(usize);

impl Dimension {
    /// Largest supported dimension.
    pub const MAX: usize = 4096;

    /// Create a dimension, rejecting zero and absurdly large values.
    pub fn new(d: usize) -> Result<Self, LatticeError> {
        if d == 0 {
            return Err(LatticeError::ZeroDimension);
        }
        if d > Self::MAX {
            return Err(LatticeError::TooLarge {
                requested: d,
                max: Self::MAX,
            });
        }
        Ok(Self(d))
    }

    /// The raw dimension `d`.
    pub fn get(self) -> usize {
        self.0
    }

    /// Number of neighbors of every site, `2d`.
    pub fn coordination_number(self) -> u32 {
        2 * self.0 as u32
    }

    /// The `2d` unit steps `(axis, ±1)` in a fixed order:
    /// `+e₀, −e₀, +e₁, −e₁, …`.
    pub fn unit_steps(self) -> UnitSteps {
        UnitSteps::for_len(self.0)
    }

    /// The `n`-th unit step in [`unit_steps`](Self::unit_steps) order, for
    /// `n < 2d`.
    pub fn unit_step(self, n: usize) -> (usize, i32) {
        debug_assert!(n < 2 * self.0, "unit step {n} out of range for dimension {}", self.0);
        step_at(n)
    }
}

fn step_at(n: usize) -> (usize, i32) {
    let delta = if n % 2 == 0 { 1 } else { -1 };
    (n / 2, delta)
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for Dimension {
    type Error = LatticeError;

    fn try_from(d: usize) -> Result<Self, Self::Error> {
        Self::new(d)
    }
}

/// Iterator over the `2d` unit steps of a dimension.
#[derive(Debug, Clone)]
pub struct UnitSteps {
    dimension: usize,
    next: usize,
}

impl UnitSteps {
    pub(crate) fn for_len(dimension: usize) -> Self {
        Self { dimension, next: 0 }
    }
}

impl Iterator for UnitSteps {
    type Item = (usize, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= 2 * self.dimension {
            return None;
        }
        let step = step_at(self.next);
        self.next += 1;
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = 2 * self.dimension - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for UnitSteps {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_dimension_rejected() {
        assert_eq!(Dimension::new(0), Err(LatticeError::ZeroDimension));
    }

    #[test]
    fn test_too_large_rejected() {
        let err = Dimension::new(Dimension::MAX + 1).unwrap_err();
        assert!(matches!(err, LatticeError::TooLarge { .. }));
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn test_coordination_number() {
        assert_eq!(Dimension::new(1).unwrap().coordination_number(), 2);
        assert_eq!(Dimension::new(3).unwrap().coordination_number(), 6);
    }

    #[test]
    fn test_unit_steps_order() {
        let steps: Vec<_> = Dimension::new(2).unwrap().unit_steps().collect();
        assert_eq!(steps, vec![(0, 1), (0, -1), (1, 1), (1, -1)]);
    }

    #[test]
    fn test_unit_step_matches_iterator() {
        let d = Dimension::new(4).unwrap();
        for (n, step) in d.unit_steps().enumerate() {
            assert_eq!(d.unit_step(n), step);
        }
    }

    #[test]
    fn test_unit_steps_exact_size() {
        let mut steps = Dimension::new(5).unwrap().unit_steps();
        assert_eq!(steps.len(), 10);
        steps.next();
        assert_eq!(steps.len(), 9);
    }
}
