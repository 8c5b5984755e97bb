//! End-to-end bisection runs against real trials.

use contact_dispatch_pooled::{PooledDispatch, ThreadPoolConfig};
use contact_dispatch_sync::SyncDispatch;
use contact_lattice::Dimension;
use contact_search::{
    BisectionSearch, Bracket, CollectingSink, DimensionSweep, NullSink, SweepConfig, TrialPool,
    TrialPoolConfig,
};

fn pooled(threads: usize) -> PooledDispatch {
    let config = ThreadPoolConfig::builder()
        .trial_threads(threads)
        .build()
        .unwrap();
    PooledDispatch::new(config).unwrap()
}

fn pool_config(survival_threshold: usize, base_seed: u64) -> TrialPoolConfig {
    TrialPoolConfig {
        survival_threshold,
        max_steps: None,
        base_seed,
    }
}

/// One dimension, the classic bracket [1, 2] and a coarse epsilon: five
/// halvings ending near the one-dimensional critical rate (about 1.65).
/// Far below it (1.5) a cluster of 500 is out of reach; well above it (1.75)
/// one of 25 trials gets there.
#[test]
fn test_one_dimensional_estimate() {
    let pool = TrialPool::new(pooled(4), pool_config(500, 2024));
    let sink = CollectingSink::new();
    let outcome = BisectionSearch::new(&pool, &sink)
        .estimate(1.0, 2.0, 25, 0.05, Dimension::new(1).unwrap())
        .unwrap();

    assert_eq!(outcome.iterations, 5);
    assert!(outcome.bracket.width() <= 0.05);
    assert!(outcome.bracket.low >= 1.5, "{:?}", outcome.bracket);
    assert!(outcome.bracket.high <= 1.75, "{:?}", outcome.bracket);
    assert_eq!(sink.iterations().len(), 5);
    assert_eq!(sink.completed().len(), 1);
}

/// Every step keeps the previous bracket's bounds and halves its width.
#[test]
fn test_bracket_shrinks_monotonically() {
    let pool = TrialPool::new(SyncDispatch, pool_config(40, 3));
    let sink = CollectingSink::new();
    let start = Bracket::initial(Dimension::new(2).unwrap());
    BisectionSearch::new(&pool, &sink)
        .estimate(start.low, start.high, 6, 0.02, Dimension::new(2).unwrap())
        .unwrap();

    let mut previous = start;
    for estimate in sink.iterations() {
        assert!(estimate.low >= previous.low);
        assert!(estimate.high <= previous.high);
        let width = estimate.high - estimate.low;
        assert!((width - previous.width() / 2.0).abs() < 1e-12);
        previous = Bracket::new(estimate.low, estimate.high).unwrap();
    }
    assert_eq!(sink.iterations().len() as u32, start.iterations_to(0.02));
}

/// Verdicts depend only on seeds, not on how many workers ran the trials or
/// in which order they finished.
#[test]
fn test_worker_count_does_not_change_result() {
    let dimension = Dimension::new(2).unwrap();
    let start = Bracket::initial(dimension);

    let sync_pool = TrialPool::new(SyncDispatch, pool_config(60, 77));
    let sync = BisectionSearch::new(&sync_pool, &NullSink)
        .estimate(start.low, start.high, 8, 0.02, dimension)
        .unwrap();

    for threads in [1, 3] {
        let pool = TrialPool::new(pooled(threads), pool_config(60, 77));
        let outcome = BisectionSearch::new(&pool, &NullSink)
            .estimate(start.low, start.high, 8, 0.02, dimension)
            .unwrap();
        assert_eq!(outcome.bracket, sync.bracket, "threads={threads}");
        assert_eq!(outcome.iterations, sync.iterations);
    }
}

/// Higher dimensions have lower critical rates, and a short sweep already
/// orders its estimates that way.
#[test]
fn test_sweep_estimates_decrease_with_dimension() {
    let config = SweepConfig::default()
        .with_dimensions(1, 3)
        .with_attempts(10)
        .with_survival_threshold(100)
        .with_epsilon(0.05)
        .with_seed(12);
    let sweep = DimensionSweep::new(pooled(4), config).unwrap();
    let report = sweep.run(&NullSink).unwrap();

    assert_eq!(report.estimates.len(), 3);
    for pair in report.estimates.windows(2) {
        assert!(
            pair[1].midpoint() < pair[0].midpoint(),
            "d={} [{}, {}] vs d={} [{}, {}]",
            pair[0].dimension,
            pair[0].low,
            pair[0].high,
            pair[1].dimension,
            pair[1].low,
            pair[1].high
        );
    }

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["seed"], 12);
    assert_eq!(json["estimates"].as_array().unwrap().len(), 3);
}
