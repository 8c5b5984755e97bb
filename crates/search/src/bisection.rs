//! Bisection on the infection rate.

use crate::pool::TrialPool;
use crate::report::{Estimate, ReportSink};
use crate::{Bracket, SearchError};
use contact_dispatch::Dispatch;
use contact_lattice::Dimension;
use tracing::{debug, warn};

/// Result of one bisection run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOutcome {
    pub dimension: usize,
    pub bracket: Bracket,
    pub iterations: u32,
    /// Trials that ran to a verdict across all batches.
    pub trials_run: usize,
    /// Trials that panicked or never reported.
    pub trials_failed: usize,
}

/// Narrows a rate bracket by asking the trial pool whether the epidemic can
/// survive at the midpoint.
///
/// If any trial survives at `mid`, the critical rate is taken to be at most
/// `mid` and `high` moves down; otherwise `low` moves up. The oracle is
/// one-sided. A survivor shows the threshold is reachable at that rate,
/// while a batch with no survivor is only weak evidence that it is not.
pub struct BisectionSearch<'a, D: Dispatch> {
    pool: &'a TrialPool<D>,
    sink: &'a dyn ReportSink,
}

impl<'a, D: Dispatch> BisectionSearch<'a, D> {
    pub fn new(pool: &'a TrialPool<D>, sink: &'a dyn ReportSink) -> Self {
        Self { pool, sink }
    }

    /// Halve `[low, high]` until its width is at most `epsilon`.
    ///
    /// Reports the bracket to the sink after every step and once more when
    /// done. The result always satisfies `low' ≥ low`, `high' ≤ high` and
    /// `low' < high'`. Runs zero steps when the bracket is already narrow
    /// enough.
    pub fn estimate(
        &self,
        low: f64,
        high: f64,
        attempts: usize,
        epsilon: f64,
        dimension: Dimension,
    ) -> Result<SearchOutcome, SearchError> {
        let mut bracket = Bracket::new(low, high)?;
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(SearchError::InvalidEpsilon(epsilon));
        }
        if attempts == 0 {
            return Err(SearchError::ZeroAttempts);
        }

        let mut iterations = 0u32;
        let mut trials_run = 0usize;
        let mut trials_failed = 0usize;

        while bracket.width() > epsilon {
            let mid = bracket.midpoint();
            if !(bracket.low < mid && mid < bracket.high) {
                warn!(
                    dimension = dimension.get(),
                    low = bracket.low,
                    high = bracket.high,
                    epsilon,
                    "Bracket cannot be split further at f64 precision; stopping early"
                );
                break;
            }

            let verdict = self.pool.evaluate_with_stats(mid, dimension, attempts);
            trials_run += verdict.stats.settled();
            trials_failed += verdict.stats.failed;

            if verdict.survived {
                bracket.high = mid;
            } else {
                bracket.low = mid;
            }
            iterations += 1;

            debug!(
                dimension = dimension.get(),
                iteration = iterations,
                rate = mid,
                survived = verdict.survived,
                "Bisection step"
            );
            self.sink.iteration(&Estimate {
                dimension: dimension.get(),
                iteration: iterations,
                low: bracket.low,
                high: bracket.high,
            });
        }

        self.sink.dimension_complete(&Estimate {
            dimension: dimension.get(),
            iteration: iterations,
            low: bracket.low,
            high: bracket.high,
        });

        Ok(SearchOutcome {
            dimension: dimension.get(),
            bracket,
            iterations,
            trials_run,
            trials_failed,
        })
    }
}
