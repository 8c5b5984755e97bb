//! Contact process state and the one-event transition.
//!
//! The state of one realization is the lattice, the list of infected sites
//! and two running totals. The totals are updated incrementally on every
//! event and never recomputed in the hot path:
//!
//! - `total_infections` is the length of the active list (recovery rate)
//! - `open_edges` is `Σ uninfected_neighbors` over infected sites, so the
//!   total infection rate is `rate × open_edges`
//!
//! Keeping `open_edges` as an integer makes `total_rate = rate × Σ counts`
//! hold exactly after every event, with no floating-point drift.

use contact_lattice::{Coordinate, Dimension, LatticeGraph, Site};
use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;

/// Uniform guesses tried before falling back to an exact weighted scan.
const REJECTION_ATTEMPTS: usize = 16;

/// Type of a sampled Markov-chain event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An infected site infected one of its uninfected neighbors.
    Infection,
    /// An infected site healed.
    Recovery,
}

/// A bookkeeping inconsistency found by [`ContactProcess::check_invariants`].
///
/// Any of these indicates a bug in the transition code, not a runtime
/// condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("active site {site:?} is not present in the lattice")]
    ActiveMissing { site: Coordinate },

    #[error("active site {site:?} is not marked infected")]
    ActiveNotInfected { site: Coordinate },

    #[error("site {site:?} appears more than once in the active list")]
    DuplicateActive { site: Coordinate },

    #[error("infected site {site:?} is missing neighbor {neighbor:?}")]
    MissingNeighbor {
        site: Coordinate,
        neighbor: Coordinate,
    },

    #[error("active list holds {active} sites but the lattice has {infected} infected")]
    InfectedCountMismatch { active: usize, infected: usize },

    #[error("site {site:?} records {recorded} uninfected neighbors, actual {actual}")]
    NeighborCountMismatch {
        site: Coordinate,
        recorded: u32,
        actual: u32,
    },

    #[error("open edge total is {recorded}, recomputed {actual}")]
    OpenEdgeMismatch { recorded: u64, actual: u64 },
}

/// One realization of the contact process on ℤᵈ.
///
/// Created fresh per trial from a single infected site at the origin, mutated
/// only by [`step`](Self::step), and dropped when the trial ends.
#[derive(Debug, Clone)]
pub struct ContactProcess {
    /// Per-edge infection rate λ.
    rate: f64,

    /// Every site ever touched. Only grows.
    graph: LatticeGraph,

    /// Infected sites, in no particular order.
    active: Vec<Coordinate>,

    /// Σ uninfected_neighbors over active sites.
    open_edges: u64,

    /// Scratch coordinate for neighbor lookups, so probing does not allocate.
    scratch: Coordinate,

    /// Simulated time, when the optional clock is enabled.
    elapsed: Option<f64>,
}

impl ContactProcess {
    /// Seed a process with one infected site at the origin and its `2d`
    /// neighbors present as uninfected boundary sites.
    ///
    /// # Panics
    ///
    /// Panics if `rate` is negative or not finite.
    pub fn seeded(dimension: Dimension, rate: f64) -> Self {
        assert!(
            rate.is_finite() && rate >= 0.0,
            "infection rate must be finite and non-negative, got {rate}"
        );

        let coordination = dimension.coordination_number();
        let origin = Coordinate::origin(dimension);
        let mut graph = LatticeGraph::with_capacity(dimension, 1 + coordination as usize);
        for neighbor in origin.neighbors() {
            graph.insert_uninfected(neighbor, coordination - 1);
        }
        graph.insert(origin.clone(), Site::infected(coordination));

        Self {
            rate,
            graph,
            scratch: origin.clone(),
            active: vec![origin],
            open_edges: u64::from(coordination),
            elapsed: None,
        }
    }

    /// Enable the continuous-time clock.
    ///
    /// Each step then also draws an exponential holding time with the total
    /// event rate. This consumes extra randomness, so a seeded run with the
    /// clock follows a different (equally distributed) event sequence than
    /// one without.
    pub fn with_clock(mut self) -> Self {
        self.elapsed = Some(0.0);
        self
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn dimension(&self) -> Dimension {
        self.graph.dimension()
    }

    /// Number of currently infected sites. Also the total recovery rate.
    pub fn total_infections(&self) -> usize {
        self.active.len()
    }

    /// Number of (infected, uninfected) neighbor pairs.
    pub fn open_edges(&self) -> u64 {
        self.open_edges
    }

    /// Total instantaneous infection rate, `rate × open_edges`.
    pub fn total_rate(&self) -> f64 {
        self.rate * self.open_edges as f64
    }

    pub fn is_extinct(&self) -> bool {
        self.active.is_empty()
    }

    pub fn graph(&self) -> &LatticeGraph {
        &self.graph
    }

    /// Currently infected sites.
    pub fn active(&self) -> &[Coordinate] {
        &self.active
    }

    /// Number of sites ever touched.
    pub fn sites_touched(&self) -> usize {
        self.graph.len()
    }

    /// Simulated time elapsed, if the clock is enabled.
    pub fn elapsed(&self) -> Option<f64> {
        self.elapsed
    }

    /// Advance by exactly one event.
    ///
    /// The next event is an infection with probability
    /// `total_rate / (total_infections + total_rate)` and a recovery
    /// otherwise. Only the event type is sampled; its time is not needed for
    /// the survival verdict (see [`with_clock`](Self::with_clock)).
    ///
    /// # Panics
    ///
    /// Panics if the process is already extinct.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> EventKind {
        let infections = self.active.len();
        assert!(infections > 0, "step called on an extinct contact process");

        let infection_rate = self.total_rate();
        let total_rate = infections as f64 + infection_rate;

        if let Some(elapsed) = self.elapsed.as_mut() {
            let u: f64 = rng.gen();
            *elapsed -= (1.0 - u).ln() / total_rate;
        }

        if rng.gen::<f64>() * total_rate < infection_rate {
            self.infect(rng);
            EventKind::Infection
        } else {
            self.recover(rng);
            EventKind::Recovery
        }
    }

    /// Heal a uniformly chosen infected site.
    fn recover<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let index = rng.gen_range(0..self.active.len());
        let healed = self.active.swap_remove(index);

        let Self {
            graph,
            scratch,
            open_edges,
            ..
        } = self;

        let site = expect_site_mut(graph, &healed);
        debug_assert!(site.infected, "active site {healed:?} is not infected");
        site.infected = false;
        *open_edges -= u64::from(site.uninfected_neighbors);

        for (axis, delta) in graph.dimension().unit_steps() {
            scratch.assign_neighbor(&healed, axis, delta);
            let neighbor = expect_site_mut(graph, scratch);
            neighbor.uninfected_neighbors += 1;
            if neighbor.infected {
                *open_edges += 1;
            }
        }
    }

    /// Pick an infected site weighted by its uninfected neighbor count, then
    /// infect one of its uninfected neighbors uniformly.
    fn infect<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let (source_index, axis, delta) = self.sample_open_edge(rng);

        let Self {
            graph,
            active,
            scratch,
            open_edges,
            ..
        } = self;
        let dimension = graph.dimension();
        let target = active[source_index].offset(axis, delta);

        let site = expect_site_mut(graph, &target);
        debug_assert!(!site.infected, "infection target {target:?} already infected");
        site.infected = true;
        *open_edges += u64::from(site.uninfected_neighbors);

        let boundary_count = dimension.coordination_number() - 1;
        for (axis, delta) in dimension.unit_steps() {
            scratch.assign_neighbor(&target, axis, delta);
            match graph.get_mut(scratch) {
                Some(neighbor) => {
                    assert!(
                        neighbor.uninfected_neighbors > 0,
                        "site {scratch:?} would get a negative uninfected neighbor count"
                    );
                    neighbor.uninfected_neighbors -= 1;
                    if neighbor.infected {
                        *open_edges -= 1;
                    }
                }
                None => graph.insert_uninfected(scratch.clone(), boundary_count),
            }
        }

        active.push(target);
    }

    /// Choose an (infected, uninfected) neighbor pair uniformly among all
    /// `open_edges` of them. Returns the source's index in the active list
    /// and the unit step to the target.
    ///
    /// Uniform over open edges is the same as choosing the source weighted by
    /// its uninfected neighbor count and then a uniform uninfected neighbor.
    /// A uniform (source, direction) guess is accepted when it lands on an
    /// uninfected site. After [`REJECTION_ATTEMPTS`] misses the choice is made
    /// exactly by scanning the active list; both paths draw from the same
    /// distribution, so the mixture does too.
    fn sample_open_edge<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (usize, usize, i32) {
        let Self {
            graph,
            active,
            scratch,
            open_edges,
            ..
        } = self;
        let dimension = graph.dimension();
        let coordination = dimension.coordination_number() as usize;

        for _ in 0..REJECTION_ATTEMPTS {
            let index = rng.gen_range(0..active.len());
            let (axis, delta) = dimension.unit_step(rng.gen_range(0..coordination));
            scratch.assign_neighbor(&active[index], axis, delta);
            if !expect_site(graph, scratch).infected {
                return (index, axis, delta);
            }
        }

        // Exact fallback: each open edge is one ticket.
        let mut ticket = rng.gen_range(0..*open_edges);
        let mut source_index = None;
        for (index, coordinate) in active.iter().enumerate() {
            let weight = u64::from(expect_site(graph, coordinate).uninfected_neighbors);
            if ticket < weight {
                source_index = Some(index);
                break;
            }
            ticket -= weight;
        }
        let Some(source_index) = source_index else {
            panic!("open edge total {open_edges} exceeds the active sites' neighbor counts");
        };
        let source = &active[source_index];

        let mut choice = rng.gen_range(0..expect_site(graph, source).uninfected_neighbors);
        for (axis, delta) in dimension.unit_steps() {
            scratch.assign_neighbor(source, axis, delta);
            if !expect_site(graph, scratch).infected {
                if choice == 0 {
                    return (source_index, axis, delta);
                }
                choice -= 1;
            }
        }
        panic!("site {source:?} has fewer uninfected neighbors than recorded");
    }

    /// Re-derive every total and neighbor count from scratch and compare with
    /// the incrementally maintained values.
    ///
    /// O(sites × d). Intended for tests and periodic debug checks, never the
    /// hot path.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut seen = HashSet::with_capacity(self.active.len());
        let mut open_edges = 0u64;

        for coordinate in &self.active {
            if !seen.insert(coordinate) {
                return Err(InvariantViolation::DuplicateActive {
                    site: coordinate.clone(),
                });
            }
            let Some(site) = self.graph.get(coordinate) else {
                return Err(InvariantViolation::ActiveMissing {
                    site: coordinate.clone(),
                });
            };
            if !site.infected {
                return Err(InvariantViolation::ActiveNotInfected {
                    site: coordinate.clone(),
                });
            }
            if let Some(neighbor) = self
                .graph
                .neighbors(coordinate)
                .find(|n| !self.graph.contains(n))
            {
                return Err(InvariantViolation::MissingNeighbor {
                    site: coordinate.clone(),
                    neighbor,
                });
            }
            open_edges += u64::from(site.uninfected_neighbors);
        }

        let infected = self.graph.infected_count();
        if infected != self.active.len() {
            return Err(InvariantViolation::InfectedCountMismatch {
                active: self.active.len(),
                infected,
            });
        }

        for (coordinate, site) in self.graph.iter() {
            let actual = self
                .graph
                .neighbors(coordinate)
                .filter(|n| !self.graph.is_infected(n))
                .count() as u32;
            if actual != site.uninfected_neighbors {
                return Err(InvariantViolation::NeighborCountMismatch {
                    site: coordinate.clone(),
                    recorded: site.uninfected_neighbors,
                    actual,
                });
            }
        }

        if open_edges != self.open_edges {
            return Err(InvariantViolation::OpenEdgeMismatch {
                recorded: self.open_edges,
                actual: open_edges,
            });
        }

        Ok(())
    }
}

fn expect_site<'a>(graph: &'a LatticeGraph, coordinate: &Coordinate) -> &'a Site {
    match graph.get(coordinate) {
        Some(site) => site,
        None => panic!("lattice site {coordinate:?} missing: neighbor closure broken"),
    }
}

fn expect_site_mut<'a>(graph: &'a mut LatticeGraph, coordinate: &Coordinate) -> &'a mut Site {
    match graph.get_mut(coordinate) {
        Some(site) => site,
        None => panic!("lattice site {coordinate:?} missing: neighbor closure broken"),
    }
}
