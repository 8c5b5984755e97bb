//! Contact Process Critical Rate Simulator
//!
//! Estimates the critical infection rate λ_c(d) of the contact process on ℤᵈ
//! for a range of dimensions, by bisection over survival trials.
//!
//! # Architecture
//!
//! The simulator wires the workspace together:
//!
//! - **Configuration**: TOML file with per-field defaults, overridable from the CLI
//! - **Workers**: one rayon trial pool (via `contact-dispatch-pooled`) for the whole run
//! - **Search**: per-dimension bisection with early-exit batches (via `contact-search`)
//! - **Output**: progress through `tracing`, a summary table and an optional JSON report
//!
//! # Example
//!
//! ```no_run
//! use contact_simulator::{run, SimulatorConfig};
//!
//! let config = SimulatorConfig::from_toml_str("[search]\nmax_dimension = 3\n")?;
//! let report = run(&config)?;
//! for estimate in &report.estimates {
//!     println!("d={} λ_c ≈ {:.4}", estimate.dimension, estimate.midpoint());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

mod config;

pub use config::{OutputSection, SearchSection, SimulatorConfig, WorkerSection};

use anyhow::{Context, Result};
use contact_dispatch_pooled::PooledDispatch;
use contact_search::{DimensionSweep, SweepReport, TracingSink};
use std::fs;
use std::path::Path;

/// Run a full sweep as configured, logging progress through `tracing`.
pub fn run(config: &SimulatorConfig) -> Result<SweepReport> {
    let sweep_config = config.sweep_config()?;
    let dispatch = PooledDispatch::new(config.thread_pool_config()?)
        .context("Failed to start trial workers")?;

    let sweep = DimensionSweep::new(dispatch, sweep_config)?;
    let report = sweep.run(&TracingSink)?;
    Ok(report)
}

/// Write `report` as pretty-printed JSON, creating parent directories.
pub fn write_json_report(report: &SweepReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))
}
