//! Contact Process Critical Rate CLI
//!
//! Estimate λ_c(d) for a range of dimensions by bisection over parallel
//! survival trials.
//!
//! # Example
//!
//! ```bash
//! # Full default sweep, d = 1..=20, reproducible with a fixed seed
//! contact-sim --seed 42
//!
//! # Quick low-precision look at small dimensions
//! contact-sim --max-dimension 4 --epsilon 0.01 --threshold 200 --workers 8
//!
//! # Settings from a file, one of them overridden
//! contact-sim --config sweep.toml --attempts 50 --json results/sweep.json
//! ```

use anyhow::Result;
use clap::Parser;
use contact_simulator::{run, write_json_report, SimulatorConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Contact Process Critical Rate Simulator
///
/// Bisects the infection rate per dimension. Reproducible when the same seed
/// is used, regardless of worker count.
#[derive(Parser, Debug)]
#[command(name = "contact-sim")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trials per bisection step (overrides config)
    #[arg(short, long)]
    attempts: Option<usize>,

    /// Infected-site count that counts as survival (overrides config)
    #[arg(short, long)]
    threshold: Option<usize>,

    /// Smallest dimension to estimate (overrides config)
    #[arg(long)]
    min_dimension: Option<usize>,

    /// Largest dimension to estimate (overrides config)
    #[arg(short = 'd', long)]
    max_dimension: Option<usize>,

    /// Target bracket width (overrides config)
    #[arg(short, long)]
    epsilon: Option<f64>,

    /// Per-trial step budget; exhausting it counts as non-survival (overrides config)
    #[arg(long)]
    max_steps: Option<u64>,

    /// Trial worker threads (overrides config)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Random seed for reproducible results. When omitted, a random seed is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Write the final report as JSON to this path (overrides config)
    #[arg(long)]
    json: Option<PathBuf>,

    /// Do not print the summary table
    #[arg(long)]
    no_summary: bool,

    /// Log level filter (overrides RUST_LOG)
    #[arg(long, default_value = "warn,contact_search=info,contact_simulator=info,contact_sim=info")]
    log_level: String,
}

/// Apply CLI overrides to the configuration.
fn apply_overrides(config: &mut SimulatorConfig, cli: &Cli) {
    let search = &mut config.search;
    if let Some(attempts) = cli.attempts {
        search.attempts = attempts;
    }
    if let Some(threshold) = cli.threshold {
        search.survival_threshold = threshold;
    }
    if let Some(min) = cli.min_dimension {
        search.min_dimension = min;
    }
    if let Some(max) = cli.max_dimension {
        search.max_dimension = max;
    }
    if let Some(epsilon) = cli.epsilon {
        search.epsilon = epsilon;
    }
    if cli.max_steps.is_some() {
        search.max_steps = cli.max_steps;
    }
    if cli.seed.is_some() {
        search.seed = cli.seed;
    }

    if cli.workers.is_some() {
        config.workers.threads = cli.workers;
    }

    if let Some(ref json) = cli.json {
        config.output.json = Some(json.clone());
    }
    if cli.no_summary {
        config.output.summary = false;
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => SimulatorConfig::load(path)?,
        None => SimulatorConfig::default(),
    };
    apply_overrides(&mut config, &cli);

    info!(
        min_dimension = config.search.min_dimension,
        max_dimension = config.search.max_dimension,
        attempts = config.search.attempts,
        survival_threshold = config.search.survival_threshold,
        epsilon = config.search.epsilon,
        "Contact process simulator starting"
    );

    let report = run(&config)?;

    if config.output.summary {
        report.print_summary();
    }
    if let Some(path) = &config.output.json {
        write_json_report(&report, path)?;
        info!(path = %path.display(), "Report written");
    }

    Ok(())
}
