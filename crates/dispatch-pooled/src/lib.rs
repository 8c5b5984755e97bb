//! Rayon thread pool dispatch for parallel trial execution.
//!
//! This module provides [`PooledDispatch`] which runs trials on a single,
//! fixed-size rayon thread pool. The pool is built once and reused for every
//! batch of the whole run.
//!
//! # Example
//!
//! ```no_run
//! use contact_dispatch_pooled::{PooledDispatch, ThreadPoolConfig};
//!
//! // Auto-detect cores (capped at 14 workers)
//! let config = ThreadPoolConfig::auto();
//! let dispatch = PooledDispatch::new(config).unwrap();
//!
//! // Or customize
//! let config = ThreadPoolConfig::builder()
//!     .trial_threads(4)
//!     .build()
//!     .unwrap();
//!
//! let dispatch = PooledDispatch::new(config).unwrap();
//! ```

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

use contact_dispatch::Dispatch;

/// Upper bound on auto-detected trial workers.
///
/// Trials are memory hungry near criticality (the lattice only grows), so
/// the automatic configuration does not scale past this many workers.
pub const MAX_AUTO_TRIAL_THREADS: usize = 14;

/// Errors from thread pool configuration.
#[derive(Debug, Error)]
pub enum ThreadPoolError {
    #[error("Failed to build rayon thread pool: {0}")]
    RayonBuildError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Configuration for the trial thread pool.
///
/// Use `ThreadPoolConfig::auto()` to size the pool from the available cores.
#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    /// Number of worker threads running trials.
    pub trial_threads: usize,

    /// Stack size for trial threads (bytes). Default: 2MB.
    /// Trials are iterative; the lattice lives on the heap.
    pub stack_size: usize,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self::auto()
    }
}

impl ThreadPoolConfig {
    /// Automatically configure based on available CPU cores.
    ///
    /// One worker per core, at most [`MAX_AUTO_TRIAL_THREADS`].
    pub fn auto() -> Self {
        let available = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(4);

        Self::for_core_count(available)
    }

    /// Configure for a specific number of available cores.
    ///
    /// Useful for testing or when you want to limit resource usage.
    pub fn for_core_count(total_cores: usize) -> Self {
        Self {
            trial_threads: total_cores.clamp(1, MAX_AUTO_TRIAL_THREADS),
            stack_size: 2 * 1024 * 1024,
        }
    }

    /// Create a builder for custom configuration.
    pub fn builder() -> ThreadPoolConfigBuilder {
        ThreadPoolConfigBuilder::new()
    }

    /// Create a minimal configuration for testing (1 thread).
    pub fn minimal() -> Self {
        Self {
            trial_threads: 1,
            stack_size: 2 * 1024 * 1024,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ThreadPoolError> {
        if self.trial_threads == 0 {
            return Err(ThreadPoolError::InvalidConfig(
                "trial_threads must be at least 1".to_string(),
            ));
        }
        if self.stack_size < 64 * 1024 {
            return Err(ThreadPoolError::InvalidConfig(format!(
                "stack_size of {} bytes is below the 64KiB minimum",
                self.stack_size
            )));
        }
        Ok(())
    }
}

/// Builder for ThreadPoolConfig.
#[derive(Debug, Clone)]
pub struct ThreadPoolConfigBuilder {
    config: ThreadPoolConfig,
}

impl ThreadPoolConfigBuilder {
    /// Create a new builder with auto-detected defaults.
    pub fn new() -> Self {
        Self {
            config: ThreadPoolConfig::auto(),
        }
    }

    /// Set the number of trial worker threads. Not capped.
    pub fn trial_threads(mut self, count: usize) -> Self {
        self.config.trial_threads = count;
        self
    }

    /// Set stack size for trial threads.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = size;
        self
    }

    /// Build the configuration, validating it first.
    pub fn build(self) -> Result<ThreadPoolConfig, ThreadPoolError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ThreadPoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Rayon thread pool dispatch.
///
/// Owns one rayon pool for trials. Spawned closures are wrapped in
/// `rayon::ThreadPool::install()`, so any `par_iter` inside a trial stays on
/// this pool rather than the global one.
///
/// Cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct PooledDispatch {
    config: ThreadPoolConfig,
    trial_pool: Arc<rayon::ThreadPool>,
    trial_pending: Arc<AtomicUsize>,
}

impl PooledDispatch {
    /// Create a new pooled dispatch with the given configuration.
    pub fn new(config: ThreadPoolConfig) -> Result<Self, ThreadPoolError> {
        config.validate()?;

        let trial_pool = Arc::new(Self::build_trial_pool(&config)?);

        tracing::info!(
            trial_threads = config.trial_threads,
            stack_size = config.stack_size,
            "Trial thread pool initialized"
        );

        Ok(Self {
            config,
            trial_pool,
            trial_pending: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Create with auto-detected configuration.
    pub fn auto() -> Result<Self, ThreadPoolError> {
        Self::new(ThreadPoolConfig::auto())
    }

    /// Get the configuration.
    pub fn config(&self) -> &ThreadPoolConfig {
        &self.config
    }

    fn build_trial_pool(config: &ThreadPoolConfig) -> Result<rayon::ThreadPool, ThreadPoolError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.trial_threads)
            .stack_size(config.stack_size)
            .thread_name(|i| format!("trial-{}", i))
            .build()
            .map_err(|e| ThreadPoolError::RayonBuildError(e.to_string()))
    }
}

impl std::fmt::Debug for PooledDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledDispatch")
            .field("config", &self.config)
            .field("trial_pending", &self.trial_pending.load(Ordering::Relaxed))
            .finish()
    }
}

impl Dispatch for PooledDispatch {
    #[instrument(level = "debug", skip_all)]
    fn spawn_trial(&self, f: impl FnOnce() + Send + 'static) {
        self.trial_pending.fetch_add(1, Ordering::Relaxed);
        let pending = self.trial_pending.clone();
        let pool = Arc::clone(&self.trial_pool);
        self.trial_pool.spawn(move || {
            pool.install(f);
            pending.fetch_sub(1, Ordering::Relaxed);
        });
    }

    fn trial_queue_depth(&self) -> usize {
        self.trial_pending.load(Ordering::Relaxed)
    }

    fn worker_count(&self) -> usize {
        self.trial_pool.current_num_threads()
    }

    fn map_trials<T, R>(&self, items: &[T], f: impl Fn(&T) -> R + Send + Sync) -> Vec<R>
    where
        T: Sync,
        R: Send,
    {
        self.trial_pool.install(|| {
            use rayon::prelude::*;
            items.par_iter().map(f).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_config() {
        let config = ThreadPoolConfig::auto();
        assert!(config.trial_threads >= 1);
        assert!(config.trial_threads <= MAX_AUTO_TRIAL_THREADS);
        config.validate().unwrap();
    }

    #[test]
    fn test_for_core_count() {
        assert_eq!(ThreadPoolConfig::for_core_count(0).trial_threads, 1);
        assert_eq!(ThreadPoolConfig::for_core_count(1).trial_threads, 1);
        assert_eq!(ThreadPoolConfig::for_core_count(8).trial_threads, 8);
        assert_eq!(ThreadPoolConfig::for_core_count(14).trial_threads, 14);
        assert_eq!(ThreadPoolConfig::for_core_count(64).trial_threads, 14);
    }

    #[test]
    fn test_minimal_config() {
        let config = ThreadPoolConfig::minimal();
        assert_eq!(config.trial_threads, 1);
        config.validate().unwrap();
    }

    #[test]
    fn test_builder() {
        let config = ThreadPoolConfig::builder()
            .trial_threads(32)
            .stack_size(4 * 1024 * 1024)
            .build()
            .unwrap();

        // Explicit sizes are not capped.
        assert_eq!(config.trial_threads, 32);
        assert_eq!(config.stack_size, 4 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_config() {
        let result = ThreadPoolConfig::builder().trial_threads(0).build();
        assert!(result.is_err());

        let result = ThreadPoolConfig::builder().stack_size(1024).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_pooled_dispatch_creation() {
        let dispatch = PooledDispatch::new(ThreadPoolConfig::minimal()).unwrap();
        assert_eq!(dispatch.config().trial_threads, 1);
        assert_eq!(dispatch.worker_count(), 1);
    }

    #[test]
    fn test_spawn_on_pool() {
        let config = ThreadPoolConfig::builder()
            .trial_threads(2)
            .build()
            .unwrap();
        let dispatch = PooledDispatch::new(config).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();

        for i in 0..8 {
            let tx = tx.clone();
            dispatch.spawn_trial(move || {
                let name = std::thread::current().name().map(str::to_string);
                tx.send((i, name)).unwrap();
            });
        }
        drop(tx);

        let mut seen: Vec<_> = rx.iter().collect();
        seen.sort_by_key(|(i, _)| *i);
        assert_eq!(seen.len(), 8);
        for (_, name) in seen {
            assert!(name.unwrap().starts_with("trial-"));
        }
    }

    #[test]
    fn test_map_trials_preserves_order() {
        let dispatch = PooledDispatch::new(ThreadPoolConfig::minimal()).unwrap();
        let items: Vec<u64> = (0..100).collect();
        let doubled = dispatch.map_trials(&items, |x| x * 2);
        assert_eq!(doubled, items.iter().map(|x| x * 2).collect::<Vec<_>>());
    }
}
