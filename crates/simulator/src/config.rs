//! TOML configuration for a sweep run.

use anyhow::{Context, Result};
use contact_dispatch_pooled::ThreadPoolConfig;
use contact_search::SweepConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level simulator configuration.
///
/// Every field has a default, so an empty file (or no file) gives the
/// standard sweep over dimensions 1 to 20.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub search: SearchSection,

    #[serde(default)]
    pub workers: WorkerSection,

    #[serde(default)]
    pub output: OutputSection,
}

/// `[search]`: what to estimate and how precisely.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchSection {
    /// Trials per bisection step.
    #[serde(default = "default_attempts")]
    pub attempts: usize,

    /// Infected-site count that counts as survival.
    #[serde(default = "default_survival_threshold")]
    pub survival_threshold: usize,

    #[serde(default = "default_min_dimension")]
    pub min_dimension: usize,

    #[serde(default = "default_max_dimension")]
    pub max_dimension: usize,

    /// Target bracket width.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Per-trial step budget. Unbounded when absent.
    #[serde(default)]
    pub max_steps: Option<u64>,

    /// Base seed. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_attempts() -> usize {
    25
}

fn default_survival_threshold() -> usize {
    500
}

fn default_min_dimension() -> usize {
    1
}

fn default_max_dimension() -> usize {
    20
}

fn default_epsilon() -> f64 {
    0.001
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            survival_threshold: default_survival_threshold(),
            min_dimension: default_min_dimension(),
            max_dimension: default_max_dimension(),
            epsilon: default_epsilon(),
            max_steps: None,
            seed: None,
        }
    }
}

/// `[workers]`: the trial thread pool.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerSection {
    /// Worker threads. Auto-detected (at most 14) when absent.
    #[serde(default)]
    pub threads: Option<usize>,

    /// Stack size per worker, in bytes.
    #[serde(default)]
    pub stack_size: Option<usize>,
}

/// `[output]`: where results go besides the log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Write the final report as JSON to this path.
    #[serde(default)]
    pub json: Option<PathBuf>,

    /// Print the summary table to stdout.
    #[serde(default = "default_summary")]
    pub summary: bool,
}

fn default_summary() -> bool {
    true
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            json: None,
            summary: default_summary(),
        }
    }
}

impl SimulatorConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Sweep parameters, validated.
    pub fn sweep_config(&self) -> Result<SweepConfig> {
        let search = &self.search;
        let config = SweepConfig {
            attempts: search.attempts,
            survival_threshold: search.survival_threshold,
            min_dimension: search.min_dimension,
            max_dimension: search.max_dimension,
            epsilon: search.epsilon,
            max_steps: search.max_steps,
            seed: search.seed,
        };
        config.validate().context("Invalid [search] configuration")?;
        Ok(config)
    }

    /// Trial thread pool parameters, validated.
    pub fn thread_pool_config(&self) -> Result<ThreadPoolConfig> {
        let mut builder = ThreadPoolConfig::builder();
        if let Some(threads) = self.workers.threads {
            builder = builder.trial_threads(threads);
        }
        if let Some(stack_size) = self.workers.stack_size {
            builder = builder.stack_size(stack_size);
        }
        builder.build().context("Invalid [workers] configuration")
    }
}
