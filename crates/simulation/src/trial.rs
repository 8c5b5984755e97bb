//! A single realization run to a verdict.

use crate::{ContactProcess, EventKind};
use contact_lattice::Dimension;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

/// Parameters of one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialConfig {
    /// Infection rate λ.
    pub rate: f64,

    /// Lattice dimension d.
    pub dimension: Dimension,

    /// Infected-site count at which the epidemic is declared to survive.
    pub survival_threshold: usize,

    /// Step budget. `None` runs until threshold or extinction.
    ///
    /// Exhausting the budget is reported as non-survival. That is a pragmatic
    /// cutoff, not evidence of extinction, so a finite budget biases the
    /// search toward higher critical-rate estimates.
    pub max_steps: Option<u64>,

    /// Track simulated continuous time alongside the event sequence.
    pub track_time: bool,

    /// Re-derive all bookkeeping every this many steps and panic on mismatch.
    pub invariant_check_interval: Option<u64>,
}

impl TrialConfig {
    pub fn new(rate: f64, dimension: Dimension, survival_threshold: usize) -> Self {
        Self {
            rate,
            dimension,
            survival_threshold,
            max_steps: None,
            track_time: false,
            invariant_check_interval: None,
        }
    }

    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_time_tracking(mut self, enabled: bool) -> Self {
        self.track_time = enabled;
        self
    }

    /// Verify the process bookkeeping every `every` steps (O(sites) each).
    pub fn with_invariant_checks(mut self, every: u64) -> Self {
        self.invariant_check_interval = Some(every.max(1));
        self
    }
}

/// Why a trial stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// Infected count reached the survival threshold.
    Survived,
    /// Infected count returned to zero.
    DiedOut,
    /// Step budget ran out first. Counted as non-survival.
    StepBudgetExhausted,
}

/// Result of one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub termination: Termination,
    /// Events simulated.
    pub steps: u64,
    /// Infection events.
    pub infections: u64,
    /// Recovery events.
    pub recoveries: u64,
    /// Largest infected count seen.
    pub peak_infections: usize,
    /// Infected count when the trial stopped.
    pub final_infections: usize,
    /// Lattice sites ever materialized.
    pub sites_touched: usize,
    /// Simulated time, when tracked.
    pub elapsed_time: Option<f64>,
}

impl TrialOutcome {
    /// The survival verdict.
    pub fn survived(&self) -> bool {
        self.termination == Termination::Survived
    }
}

/// Run one trial with the given random source.
pub fn run_trial<R: Rng + ?Sized>(config: &TrialConfig, rng: &mut R) -> TrialOutcome {
    drive(config, rng, None)
}

/// Run one trial on its own ChaCha8 stream.
pub fn run_trial_seeded(config: &TrialConfig, seed: u64) -> TrialOutcome {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    drive(config, &mut rng, None)
}

/// Run one trial and record the infected count after every step.
pub fn run_trial_with_history<R: Rng + ?Sized>(
    config: &TrialConfig,
    rng: &mut R,
) -> (TrialOutcome, Vec<usize>) {
    let mut history = Vec::new();
    let outcome = drive(config, rng, Some(&mut history));
    (outcome, history)
}

fn drive<R: Rng + ?Sized>(
    config: &TrialConfig,
    rng: &mut R,
    mut history: Option<&mut Vec<usize>>,
) -> TrialOutcome {
    let mut process = ContactProcess::seeded(config.dimension, config.rate);
    if config.track_time {
        process = process.with_clock();
    }

    let mut steps = 0u64;
    let mut infections = 0u64;
    let mut recoveries = 0u64;
    let mut peak_infections = process.total_infections();

    let termination = loop {
        let current = process.total_infections();
        if current >= config.survival_threshold {
            break Termination::Survived;
        }
        if current == 0 {
            break Termination::DiedOut;
        }
        if config.max_steps.is_some_and(|max| steps >= max) {
            break Termination::StepBudgetExhausted;
        }

        match process.step(rng) {
            EventKind::Infection => infections += 1,
            EventKind::Recovery => recoveries += 1,
        }
        steps += 1;
        peak_infections = peak_infections.max(process.total_infections());

        if let Some(history) = history.as_deref_mut() {
            history.push(process.total_infections());
        }

        if let Some(every) = config.invariant_check_interval {
            if steps % every == 0 {
                if let Err(violation) = process.check_invariants() {
                    panic!("contact process bookkeeping fault after {steps} steps: {violation}");
                }
            }
        }
    };

    trace!(
        rate = config.rate,
        dimension = config.dimension.get(),
        ?termination,
        steps,
        peak_infections,
        "Trial finished"
    );

    TrialOutcome {
        termination,
        steps,
        infections,
        recoveries,
        peak_infections,
        final_infections: process.total_infections(),
        sites_touched: process.sites_touched(),
        elapsed_time: process.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(d: usize) -> Dimension {
        Dimension::new(d).unwrap()
    }

    #[test]
    fn test_zero_rate_dies_in_one_step() {
        let outcome = run_trial_seeded(&TrialConfig::new(0.0, dim(3), 10), 42);
        assert_eq!(outcome.termination, Termination::DiedOut);
        assert_eq!(outcome.steps, 1);
        assert_eq!(outcome.recoveries, 1);
        assert_eq!(outcome.infections, 0);
        assert!(!outcome.survived());
    }

    #[test]
    fn test_threshold_of_one_survives_immediately() {
        let outcome = run_trial_seeded(&TrialConfig::new(0.0, dim(1), 1), 42);
        assert!(outcome.survived());
        assert_eq!(outcome.steps, 0);
    }

    #[test]
    fn test_zero_step_budget() {
        let config = TrialConfig::new(1.0, dim(2), 100).with_max_steps(Some(0));
        let outcome = run_trial_seeded(&config, 42);
        assert_eq!(outcome.termination, Termination::StepBudgetExhausted);
        assert!(!outcome.survived());
    }

    #[test]
    fn test_step_budget_is_respected() {
        // Supercritical on the line; a 500-site threshold takes far more
        // than 50 events to reach.
        let config = TrialConfig::new(4.0, dim(1), 500).with_max_steps(Some(50));
        for seed in 0..20 {
            let outcome = run_trial_seeded(&config, seed);
            assert!(outcome.steps <= 50);
            assert_ne!(outcome.termination, Termination::Survived);
        }
    }

    #[test]
    fn test_event_counts_add_up() {
        let config = TrialConfig::new(1.2, dim(2), 200).with_invariant_checks(64);
        for seed in 0..10 {
            let outcome = run_trial_seeded(&config, seed);
            assert_eq!(outcome.steps, outcome.infections + outcome.recoveries);
            // Start at 1; each infection adds one, each recovery removes one.
            assert_eq!(
                outcome.final_infections as i64,
                1 + outcome.infections as i64 - outcome.recoveries as i64
            );
            assert!(outcome.peak_infections >= outcome.final_infections);
        }
    }

    #[test]
    fn test_history_matches_outcome() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let config = TrialConfig::new(2.0, dim(2), 50);
        let (outcome, history) = run_trial_with_history(&config, &mut rng);
        assert_eq!(history.len() as u64, outcome.steps);
        assert_eq!(history.last().copied().unwrap_or(1), outcome.final_infections);
        assert_eq!(history.iter().copied().max().unwrap_or(1), outcome.peak_infections);
        for pair in history.windows(2) {
            assert_eq!(pair[0].abs_diff(pair[1]), 1);
        }
    }

    #[test]
    fn test_time_tracking_reported() {
        let config = TrialConfig::new(1.0, dim(2), 20).with_time_tracking(true);
        let outcome = run_trial_seeded(&config, 5);
        assert!(outcome.elapsed_time.is_some_and(|t| t > 0.0));

        let untimed = run_trial_seeded(&TrialConfig::new(1.0, dim(2), 20), 5);
        assert!(untimed.elapsed_time.is_none());
    }
}
