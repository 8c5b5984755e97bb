//! Sparse integer lattice ℤᵈ for contact process simulation.
//!
//! This crate provides the spatial layer used by the simulator:
//!
//! - **Dimension**: validated lattice dimension `d` and the `2d` unit steps
//! - **Coordinate**: a point of ℤᵈ, used as the lookup key
//! - **LatticeGraph**: hash map from coordinate to [`Site`] that only grows
//!
//! # Lazy materialization
//!
//! The lattice is infinite, so only sites the epidemic has touched are stored.
//! The simulator maintains one closure property: every infected site has all
//! `2d` of its neighbors present in the map. A site that is absent is
//! therefore always uninfected, and the neighbor counts stored on present
//! sites are exact.
//!
//! The map is owned by a single trial and never shared between threads.
//!
//! # Design Philosophy
//!
//! This crate is self-contained and does not depend on any other workspace
//! crates, making it the foundation layer.

mod coordinate;
mod dimension;
mod graph;

pub use coordinate::{Coordinate, Neighbors};
pub use dimension::{Dimension, LatticeError, UnitSteps};
pub use graph::{LatticeGraph, Site};
