//! Tests for seeded reproducibility of trials.
//!
//! A trial driven by a seeded ChaCha8 stream must replay identically, which
//! is what makes the parallel search reproducible under a fixed base seed.

use contact_lattice::Dimension;
use contact_simulation::{run_trial, run_trial_seeded, ContactProcess, TrialConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn test_config() -> TrialConfig {
    TrialConfig::new(1.7, Dimension::new(1).unwrap(), 200)
}

/// Test that the same seed produces the same outcome.
#[test]
fn test_determinism_same_seed() {
    let config = test_config();
    for seed in [0u64, 1, 42, 12345] {
        let first = run_trial_seeded(&config, seed);
        let second = run_trial_seeded(&config, seed);
        assert_eq!(first, second, "seed {seed} did not replay");
    }
}

/// Test that a caller-supplied stream matches the seeded convenience wrapper.
#[test]
fn test_explicit_rng_matches_seeded() {
    let config = test_config();
    let mut rng = ChaCha8Rng::seed_from_u64(77);
    assert_eq!(run_trial(&config, &mut rng), run_trial_seeded(&config, 77));
}

/// Test that different seeds explore different realizations.
#[test]
fn test_different_seeds_differ() {
    let config = test_config();
    let outcomes: Vec<_> = (0..16).map(|seed| run_trial_seeded(&config, seed)).collect();
    let distinct_steps: std::collections::HashSet<_> = outcomes.iter().map(|o| o.steps).collect();
    assert!(
        distinct_steps.len() > 1,
        "16 seeds produced identical step counts"
    );
}

/// Test that the event sequence of a process replays step by step.
#[test]
fn test_process_replays_step_by_step() {
    let dimension = Dimension::new(2).unwrap();
    let mut rng_a = ChaCha8Rng::seed_from_u64(2024);
    let mut rng_b = ChaCha8Rng::seed_from_u64(2024);
    let mut a = ContactProcess::seeded(dimension, 0.9);
    let mut b = ContactProcess::seeded(dimension, 0.9);

    for _ in 0..500 {
        if a.is_extinct() {
            assert!(b.is_extinct());
            break;
        }
        assert_eq!(a.step(&mut rng_a), b.step(&mut rng_b));
        assert_eq!(a.total_infections(), b.total_infections());
        assert_eq!(a.open_edges(), b.open_edges());
    }
}
