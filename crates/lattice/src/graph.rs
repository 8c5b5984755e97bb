//! Hash-map backed lattice that grows on demand.

use crate::{Coordinate, Dimension, Neighbors};
use std::collections::HashMap;

/// State of one lattice site ever touched by a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site {
    /// Current infection state.
    pub infected: bool,
    /// Number of the `2d` neighbors that are not currently infected.
    pub uninfected_neighbors: u32,
}

impl Site {
    pub fn infected(uninfected_neighbors: u32) -> Self {
        Self {
            infected: true,
            uninfected_neighbors,
        }
    }

    pub fn uninfected(uninfected_neighbors: u32) -> Self {
        Self {
            infected: false,
            uninfected_neighbors,
        }
    }
}

/// Sparse map from coordinate to [`Site`].
///
/// Sites are inserted but never removed: memory grows monotonically with the
/// set of sites the epidemic has ever reached. Lookups and inserts are
/// amortized O(1).
///
/// Every coordinate passed in must have exactly `dimension` components. A
/// mismatch is a bookkeeping bug in the caller and panics.
#[derive(Debug, Clone)]
pub struct LatticeGraph {
    dimension: Dimension,
    sites: HashMap<Coordinate, Site>,
}

impl LatticeGraph {
    /// Create an empty lattice of the given dimension.
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            sites: HashMap::new(),
        }
    }

    /// Create an empty lattice with room for `capacity` sites.
    pub fn with_capacity(dimension: Dimension, capacity: usize) -> Self {
        Self {
            dimension,
            sites: HashMap::with_capacity(capacity),
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn get(&self, coordinate: &Coordinate) -> Option<&Site> {
        self.check_dimension(coordinate);
        self.sites.get(coordinate)
    }

    pub fn get_mut(&mut self, coordinate: &Coordinate) -> Option<&mut Site> {
        self.check_dimension(coordinate);
        self.sites.get_mut(coordinate)
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.get(coordinate).is_some()
    }

    /// Insert a site (infected or not) at a coordinate that is not yet present.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is already present; sites are never replaced.
    pub fn insert(&mut self, coordinate: Coordinate, site: Site) {
        self.check_dimension(&coordinate);
        assert!(
            site.uninfected_neighbors <= self.dimension.coordination_number(),
            "site {coordinate:?} claims {} uninfected neighbors in dimension {}",
            site.uninfected_neighbors,
            self.dimension
        );
        let previous = self.sites.insert(coordinate, site);
        assert!(previous.is_none(), "lattice site inserted twice");
    }

    /// Insert a new uninfected site with the given neighbor count.
    pub fn insert_uninfected(&mut self, coordinate: Coordinate, uninfected_neighbors: u32) {
        self.insert(coordinate, Site::uninfected(uninfected_neighbors));
    }

    /// The `2d` neighbors of a coordinate. Pure function of the coordinate;
    /// does not consult the map. The event loop visits neighbors in place with
    /// [`Coordinate::assign_neighbor`] instead, which does not allocate.
    pub fn neighbors<'a>(&self, coordinate: &'a Coordinate) -> Neighbors<'a> {
        self.check_dimension(coordinate);
        coordinate.neighbors()
    }

    /// Number of sites ever touched.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Coordinate, &Site)> {
        self.sites.iter()
    }

    /// Count infected sites by scanning the whole map. O(n); for
    /// verification only.
    pub fn infected_count(&self) -> usize {
        self.sites.values().filter(|site| site.infected).count()
    }

    /// True if the coordinate is present and infected. Absent sites are
    /// uninfected.
    pub fn is_infected(&self, coordinate: &Coordinate) -> bool {
        self.get(coordinate).is_some_and(|site| site.infected)
    }

    fn check_dimension(&self, coordinate: &Coordinate) {
        assert_eq!(
            coordinate.len(),
            self.dimension.get(),
            "coordinate {coordinate:?} does not match lattice dimension {}",
            self.dimension
        );
    }
}
