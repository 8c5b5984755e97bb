//! Critical rate search for the contact process.
//!
//! # Architecture
//!
//! ```text
//! DimensionSweep ──► BisectionSearch ──► TrialPool ──► Dispatch ──► run_trial_seeded
//!   (per d)            (per step)         (per batch)   (workers)     (per trial)
//!        │                  │
//!        └──────────────────┴──► ReportSink (progress)
//! ```
//!
//! The sweep runs dimensions in increasing order. For each it bisects the
//! bracket `[1/(2d−1), 2/d]`, asking the [`TrialPool`] whether any of
//! `attempts` trials reaches the survival threshold at the midpoint. The pool
//! and its dispatcher are created once and reused for every batch.

mod bisection;
mod bracket;
mod error;
mod pool;
mod report;
mod sweep;

pub use bisection::{BisectionSearch, SearchOutcome};
pub use bracket::Bracket;
pub use error::SearchError;
pub use pool::{trial_seed, BatchStats, BatchVerdict, SurvivalCount, TrialPool, TrialPoolConfig};
pub use report::{
    CollectingSink, DimensionEstimate, Estimate, NullSink, ReportSink, SweepReport, TracingSink,
};
pub use sweep::{DimensionSweep, SweepConfig};
