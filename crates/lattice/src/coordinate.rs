//! Points of ℤᵈ.

use crate::{Dimension, UnitSteps};
use std::fmt;

/// A point of the integer lattice ℤᵈ.
///
/// Two coordinates are neighbors iff they differ by exactly 1 in exactly one
/// component.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate(Box<[i32]>);

impl Coordinate {
    /// The origin of ℤᵈ.
    pub fn origin(dimension: Dimension) -> Self {
        Self(vec![0; dimension.get()].into_boxed_slice())
    }

    /// Build a coordinate from its components.
    pub fn from_components(components: impl Into<Box<[i32]>>) -> Self {
        Self(components.into())
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the zero-length coordinate (never stored in a graph).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn components(&self) -> &[i32] {
        &self.0
    }

    /// The coordinate moved by `delta` along `axis`.
    pub fn offset(&self, axis: usize, delta: i32) -> Self {
        let mut moved = self.clone();
        moved.shift(axis, delta);
        moved
    }

    /// Move this coordinate in place by `delta` along `axis`.
    pub fn shift(&mut self, axis: usize, delta: i32) {
        self.0[axis] += delta;
    }

    /// Overwrite this coordinate with `other` without reallocating.
    ///
    /// # Panics
    ///
    /// Panics if the two coordinates have different lengths.
    pub fn assign(&mut self, other: &Coordinate) {
        self.0.copy_from_slice(&other.0);
    }

    /// Overwrite this coordinate with the neighbor of `base` one unit step
    /// away, without reallocating.
    pub fn assign_neighbor(&mut self, base: &Coordinate, axis: usize, delta: i32) {
        self.assign(base);
        self.shift(axis, delta);
    }

    /// The `2d` neighbors, in [`Dimension::unit_steps`] order.
    pub fn neighbors(&self) -> Neighbors<'_> {
        Neighbors {
            base: self,
            steps: UnitSteps::for_len(self.len()),
        }
    }

    /// True iff `other` is one unit step away.
    pub fn is_adjacent(&self, other: &Coordinate) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut differing = self
            .0
            .iter()
            .zip(other.0.iter())
            .filter(|(a, b)| a != b);
        matches!(
            (differing.next(), differing.next()),
            (Some((a, b)), None) if a.abs_diff(*b) == 1
        )
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}

impl From<Vec<i32>> for Coordinate {
    fn from(components: Vec<i32>) -> Self {
        Self(components.into_boxed_slice())
    }
}

impl<const N: usize> From<[i32; N]> for Coordinate {
    fn from(components: [i32; N]) -> Self {
        Self(Box::new(components))
    }
}

/// Iterator over the neighbors of a coordinate.
#[derive(Debug, Clone)]
pub struct Neighbors<'a> {
    base: &'a Coordinate,
    steps: UnitSteps,
}

impl Iterator for Neighbors<'_> {
    type Item = Coordinate;

    fn next(&mut self) -> Option<Self::Item> {
        let (axis, delta) = self.steps.next()?;
        Some(self.base.offset(axis, delta))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.steps.size_hint()
    }
}

impl ExactSizeIterator for Neighbors<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let origin = Coordinate::origin(Dimension::new(3).unwrap());
        assert_eq!(origin.components(), &[0, 0, 0]);
    }

    #[test]
    fn test_neighbors_of_origin() {
        let origin = Coordinate::origin(Dimension::new(2).unwrap());
        let neighbors: Vec<_> = origin.neighbors().collect();
        assert_eq!(
            neighbors,
            vec![
                Coordinate::from([1, 0]),
                Coordinate::from([-1, 0]),
                Coordinate::from([0, 1]),
                Coordinate::from([0, -1]),
            ]
        );
        assert!(neighbors.iter().all(|n| n.is_adjacent(&origin)));
    }

    #[test]
    fn test_adjacency() {
        let a = Coordinate::from([2, -1, 0]);
        assert!(a.is_adjacent(&Coordinate::from([2, 0, 0])));
        assert!(!a.is_adjacent(&a));
        assert!(!a.is_adjacent(&Coordinate::from([3, 0, 0])));
        assert!(!a.is_adjacent(&Coordinate::from([2, 1, 0])));
        assert!(!a.is_adjacent(&Coordinate::from([2, -1])));
    }

    #[test]
    fn test_assign_neighbor_reuses_buffer() {
        let base = Coordinate::from([5, 5]);
        let mut scratch = Coordinate::from([0, 0]);
        scratch.assign_neighbor(&base, 1, -1);
        assert_eq!(scratch, Coordinate::from([5, 4]));
        scratch.assign_neighbor(&base, 0, 1);
        assert_eq!(scratch, Coordinate::from([6, 5]));
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", Coordinate::from([1, -2, 3])), "(1, -2, 3)");
    }
}
