//! Synchronous inline dispatch for deterministic trial execution.
//!
//! [`SyncDispatch`] runs all closures inline on the calling thread, in the
//! order dispatched. Queue depth is always 0.

use contact_dispatch::Dispatch;

/// Synchronous dispatch that runs closures inline.
///
/// Used by tests that need a fully deterministic schedule. Every trial of a
/// batch has finished by the time the dispatching loop returns, so early
/// exit saves no work here.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncDispatch;

impl SyncDispatch {
    pub fn new() -> Self {
        Self
    }
}

impl Dispatch for SyncDispatch {
    fn spawn_trial(&self, f: impl FnOnce() + Send + 'static) {
        f();
    }

    fn trial_queue_depth(&self) -> usize {
        0
    }

    fn worker_count(&self) -> usize {
        1
    }

    fn map_trials<T, R>(&self, items: &[T], f: impl Fn(&T) -> R + Send + Sync) -> Vec<R>
    where
        T: Sync,
        R: Send,
    {
        items.iter().map(f).collect()
    }
}
