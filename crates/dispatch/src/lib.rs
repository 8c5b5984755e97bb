//! Dispatch trait for scheduling simulation trials onto workers.
//!
//! This crate defines the [`Dispatch`] trait used by the trial pool to run
//! independent contact process realizations.
//!
//! Dispatch decides *where* a trial runs, not *what* it computes. The trial
//! pool hands over fire-and-forget closures and collects their verdicts over
//! a channel captured in each closure:
//!
//! - `SyncDispatch` (`contact-dispatch-sync`) runs closures inline (deterministic tests)
//! - `PooledDispatch` (`contact-dispatch-pooled`) uses a rayon thread pool (real runs)
//!
//! A single dispatch instance is created once and reused for every batch of
//! every bisection step and every dimension.

/// Trait for dispatching CPU-bound trial work to a worker pool.
///
/// Implementations schedule fire-and-forget closures. Results are
/// communicated back via channels captured in the closures.
///
/// # Panics inside closures
///
/// Implementations are not required to survive a panicking closure. Callers
/// that need failures reported (the trial pool does) must catch unwinding
/// inside the closure themselves.
pub trait Dispatch: Send + Sync + Clone {
    /// Spawn one trial.
    ///
    /// The closure may run on another thread at any later time, or inline
    /// before this call returns.
    fn spawn_trial(&self, f: impl FnOnce() + Send + 'static);

    /// Trials spawned but not yet finished.
    fn trial_queue_depth(&self) -> usize;

    /// Number of workers trials can run on concurrently.
    fn worker_count(&self) -> usize;

    /// Map a function over items on the trial workers, potentially in parallel.
    ///
    /// This is a **blocking** call: it returns when every item is processed,
    /// with results in input order. Use it when every result is needed; use
    /// [`spawn_trial`](Self::spawn_trial) when the caller may stop early.
    fn map_trials<T, R>(&self, items: &[T], f: impl Fn(&T) -> R + Send + Sync) -> Vec<R>
    where
        T: Sync,
        R: Send;
}
