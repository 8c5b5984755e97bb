//! Critical rate estimation across a range of dimensions.

use crate::bisection::BisectionSearch;
use crate::pool::{TrialPool, TrialPoolConfig};
use crate::report::{DimensionEstimate, ReportSink, SweepReport};
use crate::{Bracket, SearchError};
use contact_dispatch::Dispatch;
use contact_lattice::Dimension;
use std::time::Instant;
use tracing::info;

/// Parameters of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Trials per bisection step.
    pub attempts: usize,

    /// Infected-site count that counts as survival.
    pub survival_threshold: usize,

    pub min_dimension: usize,
    pub max_dimension: usize,

    /// Target bracket width.
    pub epsilon: f64,

    /// Per-trial step budget. `None` is unbounded.
    pub max_steps: Option<u64>,

    /// Base seed for all trials. Drawn at random when `None`.
    pub seed: Option<u64>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            attempts: 25,
            survival_threshold: 500,
            min_dimension: 1,
            max_dimension: 20,
            epsilon: 0.001,
            max_steps: None,
            seed: None,
        }
    }
}

impl SweepConfig {
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_survival_threshold(mut self, threshold: usize) -> Self {
        self.survival_threshold = threshold;
        self
    }

    pub fn with_dimensions(mut self, min: usize, max: usize) -> Self {
        self.min_dimension = min;
        self.max_dimension = max;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.attempts == 0 {
            return Err(SearchError::ZeroAttempts);
        }
        if self.survival_threshold < 2 {
            return Err(SearchError::ThresholdTooSmall(self.survival_threshold));
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(SearchError::InvalidEpsilon(self.epsilon));
        }
        if self.max_steps == Some(0) {
            return Err(SearchError::ZeroStepBudget);
        }
        if self.min_dimension > self.max_dimension {
            return Err(SearchError::EmptyDimensionRange {
                min: self.min_dimension,
                max: self.max_dimension,
            });
        }
        Dimension::new(self.min_dimension)?;
        Dimension::new(self.max_dimension)?;
        Ok(())
    }
}

/// Runs a bisection per dimension, in increasing order, on one shared
/// trial pool.
pub struct DimensionSweep<D: Dispatch> {
    config: SweepConfig,
    pool: TrialPool<D>,
}

impl<D: Dispatch> DimensionSweep<D> {
    /// Validate `config` and build the trial pool. Draws a base seed when
    /// the config has none.
    pub fn new(dispatch: D, config: SweepConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let base_seed = config.seed.unwrap_or_else(rand::random);
        let pool = TrialPool::new(
            dispatch,
            TrialPoolConfig {
                survival_threshold: config.survival_threshold,
                max_steps: config.max_steps,
                base_seed,
            },
        );
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Base seed in use, including one drawn at random.
    pub fn seed(&self) -> u64 {
        self.pool.config().base_seed
    }

    pub fn pool(&self) -> &TrialPool<D> {
        &self.pool
    }

    /// Estimate the critical rate for every dimension in the configured
    /// range, each from its bracket `[1/(2d−1), 2/d]`.
    pub fn run(&self, sink: &dyn ReportSink) -> Result<SweepReport, SearchError> {
        let started = Instant::now();
        let search = BisectionSearch::new(&self.pool, sink);

        info!(
            min_dimension = self.config.min_dimension,
            max_dimension = self.config.max_dimension,
            attempts = self.config.attempts,
            survival_threshold = self.config.survival_threshold,
            epsilon = self.config.epsilon,
            seed = self.seed(),
            workers = self.pool.dispatch().worker_count(),
            "Starting critical rate sweep"
        );

        let mut estimates = Vec::new();
        for d in self.config.min_dimension..=self.config.max_dimension {
            let dimension = Dimension::new(d)?;
            let initial = Bracket::initial(dimension);
            info!(
                dimension = d,
                low = initial.low,
                high = initial.high,
                expected_iterations = initial.iterations_to(self.config.epsilon),
                "Estimating critical rate"
            );

            let dimension_started = Instant::now();
            let outcome = search.estimate(
                initial.low,
                initial.high,
                self.config.attempts,
                self.config.epsilon,
                dimension,
            )?;

            estimates.push(DimensionEstimate {
                dimension: d,
                low: outcome.bracket.low,
                high: outcome.bracket.high,
                initial_low: initial.low,
                initial_high: initial.high,
                iterations: outcome.iterations,
                trials_run: outcome.trials_run,
                trials_failed: outcome.trials_failed,
                wall_secs: dimension_started.elapsed().as_secs_f64(),
            });
        }

        Ok(SweepReport {
            seed: self.seed(),
            attempts: self.config.attempts,
            survival_threshold: self.config.survival_threshold,
            epsilon: self.config.epsilon,
            max_steps: self.config.max_steps,
            worker_count: self.pool.dispatch().worker_count(),
            estimates,
            wall_secs: started.elapsed().as_secs_f64(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingSink;
    use contact_dispatch_sync::SyncDispatch;

    #[test]
    fn test_defaults() {
        let config = SweepConfig::default();
        assert_eq!(config.attempts, 25);
        assert_eq!(config.survival_threshold, 500);
        assert_eq!((config.min_dimension, config.max_dimension), (1, 20));
        assert_eq!(config.epsilon, 0.001);
        assert_eq!(config.max_steps, None);
        config.validate().unwrap();
    }

    #[test]
    fn test_validation() {
        let base = SweepConfig::default();
        assert_eq!(
            base.clone().with_attempts(0).validate(),
            Err(SearchError::ZeroAttempts)
        );
        assert_eq!(
            base.clone().with_survival_threshold(1).validate(),
            Err(SearchError::ThresholdTooSmall(1))
        );
        assert_eq!(
            base.clone().with_epsilon(-1.0).validate(),
            Err(SearchError::InvalidEpsilon(-1.0))
        );
        assert_eq!(
            base.clone().with_max_steps(Some(0)).validate(),
            Err(SearchError::ZeroStepBudget)
        );
        assert_eq!(
            base.clone().with_dimensions(3, 2).validate(),
            Err(SearchError::EmptyDimensionRange { min: 3, max: 2 })
        );
        assert!(matches!(
            base.with_dimensions(0, 2).validate(),
            Err(SearchError::Lattice(_))
        ));
    }

    #[test]
    fn test_seed_is_kept_or_drawn() {
        let fixed = DimensionSweep::new(SyncDispatch, SweepConfig::default().with_seed(99)).unwrap();
        assert_eq!(fixed.seed(), 99);

        // A drawn seed is stable for the lifetime of the sweep.
        let drawn = DimensionSweep::new(SyncDispatch, SweepConfig::default()).unwrap();
        assert_eq!(drawn.seed(), drawn.seed());
    }

    #[test]
    fn test_small_sweep_reports_every_dimension() {
        let config = SweepConfig::default()
            .with_dimensions(2, 4)
            .with_attempts(4)
            .with_survival_threshold(15)
            .with_epsilon(0.1)
            .with_seed(5);
        let sweep = DimensionSweep::new(SyncDispatch, config).unwrap();
        let sink = CollectingSink::new();
        let report = sweep.run(&sink).unwrap();

        let dimensions: Vec<_> = report.estimates.iter().map(|e| e.dimension).collect();
        assert_eq!(dimensions, vec![2, 3, 4]);
        assert_eq!(sink.completed().len(), 3);

        for estimate in &report.estimates {
            assert!(estimate.low >= estimate.initial_low);
            assert!(estimate.high <= estimate.initial_high);
            assert!(estimate.low < estimate.high);
            assert!(estimate.high - estimate.low <= 0.1);
        }
        assert_eq!(report.seed, 5);
        assert_eq!(report.worker_count, 1);
    }
}
