//! Event-driven contact process simulation.
//!
//! This crate advances single realizations of the contact process on ℤᵈ:
//! infected sites recover at rate 1 and infect each uninfected neighbor at
//! rate λ. Simulation is exact (Gillespie-style): each step samples the type
//! of the next event of the continuous-time Markov chain rather than
//! advancing a fixed time step.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      run_trial                          │
//! │    stop on: threshold reached | extinct | step budget   │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │ step()
//!                             ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                   ContactProcess                        │
//! │                                                         │
//! │  active: Vec<Coordinate>   (swap-remove, O(1) sampling) │
//! │  open_edges: u64           (Σ uninfected neighbors)     │
//! │  graph: LatticeGraph       (grows, never shrinks)       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Each trial owns its process state outright. Nothing here is shared
//! between threads; parallelism lives one level up, across trials.

mod process;
mod trial;

pub use process::{ContactProcess, EventKind, InvariantViolation};
pub use trial::{
    run_trial, run_trial_seeded, run_trial_with_history, Termination, TrialConfig, TrialOutcome,
};
