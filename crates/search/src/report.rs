//! Progress reporting and the final sweep report.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

/// Current bracket for one dimension after some number of bisection steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub dimension: usize,
    /// Bisection steps completed so far.
    pub iteration: u32,
    pub low: f64,
    pub high: f64,
}

/// Receives progress from the bisection.
///
/// Called on the thread driving the search, never from trial workers.
pub trait ReportSink: Send + Sync {
    /// After every bisection step.
    fn iteration(&self, estimate: &Estimate);

    /// Once per dimension, with the final bracket.
    fn dimension_complete(&self, estimate: &Estimate);
}

/// Logs progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn iteration(&self, estimate: &Estimate) {
        info!(
            dimension = estimate.dimension,
            iteration = estimate.iteration,
            low = estimate.low,
            high = estimate.high,
            "Critical rate bracket narrowed"
        );
    }

    fn dimension_complete(&self, estimate: &Estimate) {
        info!(
            dimension = estimate.dimension,
            iterations = estimate.iteration,
            low = estimate.low,
            high = estimate.high,
            "Critical rate estimate complete"
        );
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn iteration(&self, _estimate: &Estimate) {}

    fn dimension_complete(&self, _estimate: &Estimate) {}
}

/// Keeps every report in memory. Handy in tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    iterations: Mutex<Vec<Estimate>>,
    completed: Mutex<Vec<Estimate>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iterations(&self) -> Vec<Estimate> {
        self.iterations.lock().clone()
    }

    pub fn completed(&self) -> Vec<Estimate> {
        self.completed.lock().clone()
    }
}

impl ReportSink for CollectingSink {
    fn iteration(&self, estimate: &Estimate) {
        self.iterations.lock().push(*estimate);
    }

    fn dimension_complete(&self, estimate: &Estimate) {
        self.completed.lock().push(*estimate);
    }
}

/// Final result for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionEstimate {
    pub dimension: usize,
    pub low: f64,
    pub high: f64,
    pub initial_low: f64,
    pub initial_high: f64,
    pub iterations: u32,
    /// Trials that ran to a verdict, summed over all batches.
    pub trials_run: usize,
    /// Trials that panicked and were counted as non-survival.
    pub trials_failed: usize,
    pub wall_secs: f64,
}

impl DimensionEstimate {
    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

/// Result of a full dimension sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    /// Base seed every trial seed was derived from. Rerunning with it
    /// reproduces the verdicts.
    pub seed: u64,
    pub attempts: usize,
    pub survival_threshold: usize,
    pub epsilon: f64,
    pub max_steps: Option<u64>,
    pub worker_count: usize,
    pub estimates: Vec<DimensionEstimate>,
    pub wall_secs: f64,
}

impl SweepReport {
    pub fn print_summary(&self) {
        println!("\n═══════════════════════════════════════════");
        println!("      CRITICAL RATE ESTIMATION REPORT      ");
        println!("═══════════════════════════════════════════");
        println!();
        println!("Parameters:");
        println!("  Attempts:   {}", self.attempts);
        println!("  Threshold:  {}", self.survival_threshold);
        println!("  Epsilon:    {}", self.epsilon);
        match self.max_steps {
            Some(steps) => println!("  Max steps:  {}", steps),
            None => println!("  Max steps:  unbounded"),
        }
        println!("  Workers:    {}", self.worker_count);
        println!("  Seed:       {}", self.seed);
        println!();
        println!("Estimates:");
        for estimate in &self.estimates {
            println!(
                "  d={:<3} λ_c ∈ ({:.6}, {:.6}]  ({} steps, {} trials, {:.2}s)",
                estimate.dimension,
                estimate.low,
                estimate.high,
                estimate.iterations,
                estimate.trials_run,
                estimate.wall_secs
            );
            if estimate.trials_failed > 0 {
                println!("         {} trials failed", estimate.trials_failed);
            }
        }
        println!();
        println!("Duration: {:.2}s", self.wall_secs);
        println!("═══════════════════════════════════════════\n");
    }
}
