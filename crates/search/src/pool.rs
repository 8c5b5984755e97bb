//! Batched parallel evaluation of the survival oracle.
//!
//! A batch runs `attempts` independent trials at one rate and answers a
//! single question: did *any* of them survive? The answer is known as soon
//! as the first survivor reports, so the pool stops listening at that point
//! and raises an abandon flag. Trials that have not started yet see the flag
//! and exit without simulating; trials already running finish in the
//! background and their reports are dropped.
//!
//! Each trial runs on its own ChaCha8 stream seeded from
//! `(base_seed, batch, index)`. The verdict is an OR over trials, so it does
//! not depend on completion order: two pools with the same base seed that
//! are asked the same sequence of questions give the same answers whatever
//! the worker count.

use contact_dispatch::Dispatch;
use contact_lattice::Dimension;
use contact_simulation::{run_trial_seeded, TrialConfig};
use crossbeam::channel;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Trial parameters shared by every batch of a pool.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialPoolConfig {
    pub survival_threshold: usize,
    pub max_steps: Option<u64>,
    pub base_seed: u64,
}

/// Per-batch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Trials handed to the dispatcher.
    pub dispatched: usize,
    /// Trials that reported reaching the survival threshold.
    pub survived: usize,
    /// Trials that reported extinction or an exhausted step budget.
    pub died: usize,
    /// Trials that panicked or vanished without reporting.
    pub failed: usize,
    /// Trials whose report was never awaited because the verdict was
    /// already known.
    pub abandoned: usize,
}

impl BatchStats {
    /// Trials whose result was taken into account.
    pub fn settled(&self) -> usize {
        self.survived + self.died + self.failed
    }
}

/// Verdict of one batch plus how it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchVerdict {
    pub survived: bool,
    pub stats: BatchStats,
}

/// Survival frequency over a batch where every trial runs to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurvivalCount {
    pub survived: usize,
    pub trials: usize,
}

impl SurvivalCount {
    pub fn fraction(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.survived as f64 / self.trials as f64
        }
    }
}

enum TrialReport {
    Finished { survived: bool },
    Failed(String),
}

/// Runs batches of independent trials on a [`Dispatch`].
///
/// One pool is built per run and reused for every batch.
#[derive(Debug)]
pub struct TrialPool<D: Dispatch> {
    dispatch: D,
    config: TrialPoolConfig,
    batches: AtomicU64,
    /// Trials that found their batch already decided and never simulated.
    skipped: Arc<AtomicU64>,
}

impl<D: Dispatch> TrialPool<D> {
    pub fn new(dispatch: D, config: TrialPoolConfig) -> Self {
        Self {
            dispatch,
            config,
            batches: AtomicU64::new(0),
            skipped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn dispatch(&self) -> &D {
        &self.dispatch
    }

    pub fn config(&self) -> &TrialPoolConfig {
        &self.config
    }

    /// Batches started so far.
    pub fn batches_run(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    /// Trials, over the pool's lifetime, that started after their batch was
    /// decided and exited without simulating.
    ///
    /// Trials still queued when a batch returns are counted only once a
    /// worker picks them up.
    pub fn trials_skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Whether at least one of `attempts` trials at `rate` survives.
    pub fn evaluate(&self, rate: f64, dimension: Dimension, attempts: usize) -> bool {
        self.evaluate_with_stats(rate, dimension, attempts).survived
    }

    /// [`evaluate`](Self::evaluate), also returning per-batch counters.
    ///
    /// Returns as soon as the first survivor reports. A trial that panics is
    /// logged and counted as non-survival; it never aborts the batch.
    pub fn evaluate_with_stats(
        &self,
        rate: f64,
        dimension: Dimension,
        attempts: usize,
    ) -> BatchVerdict {
        let batch = self.batches.fetch_add(1, Ordering::Relaxed);
        let trial_config = Arc::new(self.trial_config(rate, dimension));
        let abandon = Arc::new(AtomicBool::new(false));

        // Capacity for every report, so late trials never block on send.
        let (tx, rx) = channel::bounded(attempts);
        for index in 0..attempts {
            let tx = tx.clone();
            let abandon = Arc::clone(&abandon);
            let skipped = Arc::clone(&self.skipped);
            let trial_config = Arc::clone(&trial_config);
            let seed = trial_seed(self.config.base_seed, batch, index as u64);

            self.dispatch.spawn_trial(move || {
                // The flag is only raised after the receiver stops listening,
                // so a skipped trial has nobody to report to.
                if abandon.load(Ordering::Acquire) {
                    skipped.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                // Receiver is gone once the verdict is known.
                let _ = tx.send(run_guarded(&trial_config, seed));
            });
        }
        drop(tx);

        let mut stats = BatchStats {
            dispatched: attempts,
            ..BatchStats::default()
        };
        let mut survived = false;

        for _ in 0..attempts {
            match rx.recv() {
                Ok(TrialReport::Finished { survived: true }) => {
                    stats.survived += 1;
                    survived = true;
                    abandon.store(true, Ordering::Release);
                    break;
                }
                Ok(TrialReport::Finished { survived: false }) => stats.died += 1,
                Ok(TrialReport::Failed(message)) => {
                    stats.failed += 1;
                    warn!(
                        rate,
                        dimension = dimension.get(),
                        batch,
                        error = %message,
                        "Trial failed; counted as non-survival"
                    );
                }
                Err(_) => {
                    let missing = attempts - stats.settled();
                    stats.failed += missing;
                    warn!(
                        rate,
                        dimension = dimension.get(),
                        batch,
                        missing,
                        "Trial workers disconnected without reporting; counted as non-survival"
                    );
                    break;
                }
            }
        }
        stats.abandoned = attempts - stats.settled();

        debug!(
            rate,
            dimension = dimension.get(),
            batch,
            survived,
            died = stats.died,
            failed = stats.failed,
            abandoned = stats.abandoned,
            "Batch complete"
        );

        BatchVerdict { survived, stats }
    }

    /// Run all `attempts` trials at `rate` to completion and count survivors.
    ///
    /// No early exit: this estimates the survival probability rather than
    /// answering the bisection's yes/no question. Panicking trials count as
    /// non-survival.
    pub fn survival_count(&self, rate: f64, dimension: Dimension, attempts: usize) -> SurvivalCount {
        let batch = self.batches.fetch_add(1, Ordering::Relaxed);
        let trial_config = self.trial_config(rate, dimension);
        let seeds: Vec<u64> = (0..attempts as u64)
            .map(|index| trial_seed(self.config.base_seed, batch, index))
            .collect();

        let verdicts = self.dispatch.map_trials(&seeds, |&seed| {
            match run_guarded(&trial_config, seed) {
                TrialReport::Finished { survived } => survived,
                TrialReport::Failed(message) => {
                    warn!(rate, batch, error = %message, "Trial failed; counted as non-survival");
                    false
                }
            }
        });

        SurvivalCount {
            survived: verdicts.into_iter().filter(|&s| s).count(),
            trials: attempts,
        }
    }

    fn trial_config(&self, rate: f64, dimension: Dimension) -> TrialConfig {
        TrialConfig::new(rate, dimension, self.config.survival_threshold)
            .with_max_steps(self.config.max_steps)
    }
}

/// Seed of trial `index` in batch `batch`.
///
/// Distinct for every (batch, index) pair with fewer than 2³² trials per
/// batch. ChaCha8's seed expansion decorrelates neighboring seeds.
pub fn trial_seed(base_seed: u64, batch: u64, index: u64) -> u64 {
    base_seed.wrapping_add(batch << 32).wrapping_add(index)
}

fn run_guarded(config: &TrialConfig, seed: u64) -> TrialReport {
    match panic::catch_unwind(AssertUnwindSafe(|| run_trial_seeded(config, seed))) {
        Ok(outcome) => TrialReport::Finished {
            survived: outcome.survived(),
        },
        Err(payload) => TrialReport::Failed(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
